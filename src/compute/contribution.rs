//! Database-wide contribution matrix.
//!
//! Every dataset of a database is used as a functional unit in turn. For each
//! root, the characterized score attributed to every dataset's own exchanges is
//! taken in absolute value and normalized, giving one column per root. This is
//! a single level of decomposition per root, not a recursive walk.

use crate::analysis::telemetry::{ColumnOutcome, SweepTelemetry};
use crate::error::AnalysisError;
use crate::solver::{FunctionalUnit, LcaSolver};
use crate::store::{NodeId, ProcessKey, Registry};
use indexmap::IndexMap;
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Square matrix of relative contributions, rows and columns in dataset order.
///
/// Column `j` holds the share of root `j`'s score attributed to each row
/// dataset; it sums to one, or is entirely zero when the root scored zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionMatrix {
    values: DMatrix<f64>,
    lookup: IndexMap<ProcessKey, usize>,
}

impl ContributionMatrix {
    pub fn dimension(&self) -> usize { self.lookup.len() }
    pub fn values(&self) -> &DMatrix<f64> { &self.values }

    /// Dataset key → row/column index.
    pub fn lookup(&self) -> &IndexMap<ProcessKey, usize> { &self.lookup }

    pub fn get(&self, row: &ProcessKey, column: &ProcessKey) -> Option<f64> {
        Some(self.values[(*self.lookup.get(row)?, *self.lookup.get(column)?)])
    }

    pub fn column(&self, root: &ProcessKey) -> Option<Vec<f64>> {
        let col = *self.lookup.get(root)?;
        Some(self.values.column(col).iter().copied().collect())
    }

    pub fn column_sum(&self, col: usize) -> f64 { self.values.column(col).sum() }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.row_iter().map(|row| row.iter().copied().collect()).collect()
    }
}

/// Result of one sweep: the matrix, its lookup, and timing.
#[derive(Debug, Clone)]
pub struct ContributionReport {
    pub matrix: ContributionMatrix,
    pub elapsed_seconds: f64,
    pub telemetry: SweepTelemetry,
}

impl ContributionReport {
    pub fn into_parts(self) -> (DMatrix<f64>, IndexMap<ProcessKey, usize>, f64) {
        (self.matrix.values, self.matrix.lookup, self.elapsed_seconds)
    }
}

/// Sweeps one database with a solver that has already been factorized.
pub struct ContributionSweep<'a> {
    registry: &'a Registry,
    database: &'a str,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> ContributionSweep<'a> {
    pub fn new(registry: &'a Registry, database: &'a str) -> Self {
        Self { registry, database, cancel: None }
    }

    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn datasets(&self) -> Result<&'a [NodeId], AnalysisError> {
        let keys = self.registry.all_node_keys(self.database)?;
        if keys.is_empty() {
            return Err(AnalysisError::EmptyDatabase(self.database.to_string()));
        }
        Ok(keys)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Sequential sweep reusing one solver; its functional unit is reset per root.
    pub fn run<S: LcaSolver>(&self, solver: &mut S) -> Result<ContributionReport, AnalysisError> {
        let start = Instant::now();
        let keys = self.datasets()?;
        let rows = row_positions(solver, keys);
        info!(database = self.database, datasets = keys.len(), "Starting contribution sweep");

        let mut outcomes = Vec::with_capacity(keys.len());
        for &root in keys {
            let outcome = if self.is_cancelled() {
                ColumnOutcome::Cancelled
            } else {
                evaluate_root(solver, root, &rows)
            };
            outcomes.push(outcome);
        }
        self.assemble(keys, outcomes, start)
    }

    /// Parallel sweep: roots are split into one chunk per rayon thread and
    /// each chunk works on its own clone of the factorized solver.
    pub fn run_parallel<S>(&self, solver: &S) -> Result<ContributionReport, AnalysisError>
    where
        S: LcaSolver + Clone + Send + Sync,
    {
        let start = Instant::now();
        let keys = self.datasets()?;
        let rows = row_positions(solver, keys);
        let chunk = chunk_len(keys.len(), rayon::current_num_threads());
        info!(database = self.database, datasets = keys.len(), chunk, "Starting parallel contribution sweep");

        let chunks: Vec<Vec<ColumnOutcome>> = keys
            .par_chunks(chunk)
            .map(|roots| {
                let mut worker = solver.clone();
                roots
                    .iter()
                    .map(|&root| {
                        if self.is_cancelled() {
                            ColumnOutcome::Cancelled
                        } else {
                            evaluate_root(&mut worker, root, &rows)
                        }
                    })
                    .collect()
            })
            .collect();
        let outcomes = chunks.into_iter().flatten().collect();
        self.assemble(keys, outcomes, start)
    }

    fn assemble(
        &self,
        keys: &[NodeId],
        outcomes: Vec<ColumnOutcome>,
        start: Instant,
    ) -> Result<ContributionReport, AnalysisError> {
        let n = keys.len();
        let mut values = DMatrix::<f64>::zeros(n, n);
        let mut telemetry = SweepTelemetry::default();

        for (col, outcome) in outcomes.into_iter().enumerate() {
            telemetry.record(&outcome);
            match outcome {
                ColumnOutcome::Normalized(column) => {
                    for (row, v) in column.into_iter().enumerate() {
                        values[(row, col)] = v;
                    }
                }
                ColumnOutcome::Failed(reason) => {
                    warn!(root = %self.registry.node(keys[col]).key, %reason, "LCA score failed; column left at zero");
                }
                ColumnOutcome::Zero => {}
                ColumnOutcome::Cancelled => return Err(AnalysisError::Cancelled),
            }
        }

        let lookup = keys
            .iter()
            .enumerate()
            .map(|(i, &id)| (self.registry.node(id).key.clone(), i))
            .collect();

        telemetry.elapsed = start.elapsed();
        info!(
            database = self.database,
            roots = telemetry.roots,
            zero_columns = telemetry.zero_columns,
            failed_roots = telemetry.failed_roots,
            elapsed_ms = telemetry.elapsed.as_millis() as u64,
            "Finished contribution sweep"
        );

        Ok(ContributionReport {
            matrix: ContributionMatrix { values, lookup },
            elapsed_seconds: telemetry.elapsed.as_secs_f64(),
            telemetry,
        })
    }
}

/// Roots per chunk so that `threads` chunks cover `roots`.
fn chunk_len(roots: usize, threads: usize) -> usize {
    roots.div_ceil(threads.max(1)).max(1)
}

/// Solver column of every database row; datasets outside the technosphere map to `None`.
fn row_positions<S: LcaSolver>(solver: &S, keys: &[NodeId]) -> Vec<Option<usize>> {
    keys.iter().map(|&id| solver.technosphere_row_index(id)).collect()
}

fn evaluate_root<S: LcaSolver>(solver: &mut S, root: NodeId, rows: &[Option<usize>]) -> ColumnOutcome {
    match solver.rescale(&FunctionalUnit::single(root, 1.0)) {
        Ok(_) => normalize(&solver.activity_scores(), rows),
        Err(e) => ColumnOutcome::Failed(e.to_string()),
    }
}

/// Absolute contributions of the database rows, scaled to sum to one.
pub fn normalize(scores: &[f64], rows: &[Option<usize>]) -> ColumnOutcome {
    let column: Vec<f64> = rows
        .iter()
        .map(|row| row.and_then(|i| scores.get(i)).map_or(0.0, |s| s.abs()))
        .collect();
    let total: f64 = column.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return ColumnOutcome::Zero;
    }
    ColumnOutcome::Normalized(column.into_iter().map(|v| v / total).collect())
}
