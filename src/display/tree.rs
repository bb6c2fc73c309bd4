//! Indented text rendering of traversal output.
use super::number::{general, pad, truncate};
use crate::compute::{SupplyRecord, VisitRecord};
use crate::error::AnalysisError;
use crate::store::{NodeId, Registry};
use std::io::Write;

pub const CALCULATION_HEADER: &str = "Fraction of score | Absolute score | Amount | Activity";

const ACTIVITY_WIDTH: usize = 70;

/// Renders records one line each, indented by `level × tab`.
#[derive(Debug, Clone)]
pub struct TreeFormatter<'a> {
    registry: &'a Registry,
    tab: String,
    header: bool,
}

impl<'a> TreeFormatter<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry, tab: "  ".into(), header: true }
    }

    pub fn with_tab(mut self, tab: impl Into<String>) -> Self {
        self.tab = tab.into();
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    fn activity(&self, node: NodeId) -> String {
        truncate(&self.registry.describe(node), ACTIVITY_WIDTH)
    }

    /// `{fraction:04.3g} | {score:5.4g} | {amount:5.4g} | {activity:.70}`
    pub fn calculation_line(&self, record: &VisitRecord) -> String {
        format!(
            "{}{} | {} | {} | {}",
            self.tab.repeat(record.level),
            pad(&general(record.fraction, 3), 4, true),
            pad(&general(record.score, 4), 5, false),
            pad(&general(record.amount, 4), 5, false),
            self.activity(record.node),
        )
    }

    /// `{amount:.3g}: {activity:.70}`
    pub fn supply_line(&self, record: &SupplyRecord) -> String {
        format!(
            "{}{}: {}",
            self.tab.repeat(record.level),
            general(record.amount, 3),
            self.activity(record.node),
        )
    }

    /// Writes the header before the first record, then one line per record.
    /// Stops at the first traversal error, keeping what was already written.
    pub fn write_calculation<W, I>(&self, records: I, out: &mut W) -> Result<usize, AnalysisError>
    where
        W: Write,
        I: IntoIterator<Item = Result<VisitRecord, AnalysisError>>,
    {
        let mut lines = 0;
        for record in records {
            let record = record?;
            if lines == 0 && self.header {
                writeln!(out, "{}", CALCULATION_HEADER)?;
            }
            writeln!(out, "{}", self.calculation_line(&record))?;
            lines += 1;
        }
        Ok(lines)
    }

    pub fn write_supply_chain<W, I>(&self, records: I, out: &mut W) -> Result<usize, AnalysisError>
    where
        W: Write,
        I: IntoIterator<Item = SupplyRecord>,
    {
        let mut lines = 0;
        for record in records {
            writeln!(out, "{}", self.supply_line(&record))?;
            lines += 1;
        }
        Ok(lines)
    }
}
