//! Selection of exchange amounts to perturb in a sensitivity analysis.
//!
//! Exchanges are picked either from an explicit list of activities or from
//! everything within a number of supply chain levels of a root, then filtered
//! and laid out as a flat table.

use crate::error::AnalysisError;
use crate::store::{ExchangeEdge, ExchangeFilter, ExchangeKind, NodeId, ProcessKey, Registry};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterScope {
    Technosphere,
    Biosphere,
    /// Technosphere then biosphere, per activity.
    All,
}

impl FromStr for ParameterScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technosphere" => Ok(Self::Technosphere),
            "biosphere" => Ok(Self::Biosphere),
            "all" => Ok(Self::All),
            other => Err(format!("Unknown exchange type '{}'", other)),
        }
    }
}

/// Exchanges of each activity, in activity order.
pub fn select_by_activities(registry: &Registry, activities: &[NodeId], scope: ParameterScope) -> Vec<ExchangeEdge> {
    let mut selected = Vec::new();
    for &act in activities {
        if matches!(scope, ParameterScope::Technosphere | ParameterScope::All) {
            selected.extend(registry.exchanges(act, ExchangeKind::Technosphere));
        }
        if matches!(scope, ParameterScope::Biosphere | ParameterScope::All) {
            selected.extend(registry.exchanges(act, ExchangeKind::Biosphere));
        }
    }
    selected
}

/// Like [`select_by_activities`] with the scope given as text; unknown text selects nothing.
pub fn select_by_activity_list(registry: &Registry, activities: &[NodeId], exc_type: &str) -> Vec<ExchangeEdge> {
    match exc_type.parse() {
        Ok(scope) => select_by_activities(registry, activities, scope),
        Err(reason) => {
            warn!(%reason, "No parameters selected");
            Vec::new()
        }
    }
}

/// Non-zero biosphere then technosphere exchanges of every activity within
/// `max_level` levels of `root` (`max_level = 1` is the root alone).
///
/// Every path is followed, including self-referencing inputs, so an input
/// reached twice contributes its exchanges twice.
pub fn select_by_supply_chain_level(registry: &Registry, root: NodeId, max_level: usize) -> Vec<ExchangeEdge> {
    let mut selected = Vec::new();
    let mut stack = vec![(root, 1usize)];

    while let Some((act, level)) = stack.pop() {
        let biosphere = without_zeros(registry.exchanges(act, ExchangeKind::Biosphere));
        let technosphere = without_zeros(registry.exchanges(act, ExchangeKind::Technosphere));
        if level < max_level {
            stack.extend(technosphere.iter().rev().map(|exc| (exc.input, level + 1)));
        }
        selected.extend(biosphere);
        selected.extend(technosphere);
    }
    selected
}

/// Drops exchanges whose input is the consuming activity itself.
pub fn without_loops(exchanges: Vec<ExchangeEdge>) -> Vec<ExchangeEdge> {
    exchanges.into_iter().filter(|e| !e.is_loop()).collect()
}

pub fn without_zeros(exchanges: Vec<ExchangeEdge>) -> Vec<ExchangeEdge> {
    exchanges.into_iter().filter(|e| e.amount != 0.0).collect()
}

/// `(input, output)` pairs that occur more than once, in order of first repeat.
pub fn duplicate_pairs(registry: &Registry, exchanges: &[ExchangeEdge]) -> Vec<(ProcessKey, ProcessKey)> {
    let mut seen: HashMap<(NodeId, NodeId), usize> = HashMap::new();
    let mut repeated = Vec::new();
    for exc in exchanges {
        let count = seen.entry((exc.input, exc.output)).or_insert(0);
        *count += 1;
        if *count == 2 {
            repeated.push((registry.node(exc.input).key.clone(), registry.node(exc.output).key.clone()));
        }
    }
    repeated
}

/// One perturbable exchange amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterRow {
    pub input: ProcessKey,
    pub output: ProcessKey,
    pub input_name: String,
    pub output_name: String,
    #[serde(rename = "type")]
    pub kind: ExchangeKind,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterTable {
    pub rows: Vec<ParameterRow>,
}

impl ParameterTable {
    pub fn from_exchanges(registry: &Registry, exchanges: &[ExchangeEdge]) -> Self {
        let rows = exchanges
            .iter()
            .map(|exc| ParameterRow {
                input: registry.node(exc.input).key.clone(),
                output: registry.node(exc.output).key.clone(),
                input_name: registry.display_name(exc.input).to_string(),
                output_name: registry.display_name(exc.output).to_string(),
                kind: exc.kind,
                amount: exc.amount,
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Row count per exchange type, in first-seen order.
    pub fn counts_by_kind(&self) -> IndexMap<&'static str, usize> {
        let mut counts = IndexMap::new();
        for row in &self.rows {
            *counts.entry(row.kind.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Row count per consuming activity.
    pub fn counts_by_output(&self) -> IndexMap<ProcessKey, usize> {
        let mut counts = IndexMap::new();
        for row in &self.rows {
            *counts.entry(row.output.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// All exchanges of one activity, every kind, in stored order.
pub fn all_exchanges(registry: &Registry, act: NodeId) -> Vec<ExchangeEdge> {
    registry.exchanges(act, ExchangeFilter::All)
}
