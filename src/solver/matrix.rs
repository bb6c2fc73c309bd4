//! Dense matrix LCA: technosphere `A`, biosphere `B`, characterization `c`.
//!
//! Supply `s = A⁻¹ f`, inventory `g = B s`, score `cᵀ g`. `A` is LU-factorized
//! once and every later rescale is a pair of triangular solves.

use super::problem::{FunctionalUnit, LcaSolver};
use crate::error::{AnalysisError, SolverError};
use crate::store::{ExchangeFilter, ExchangeKind, MethodKey, NodeId, Registry};
use indexmap::IndexMap;
use nalgebra::linalg::LU;
use nalgebra::{DMatrix, DVector, Dyn};
use std::sync::Arc;
use tracing::debug;

/// Clones share the assembled matrices and the factorization; only the
/// supply vector and score of the last solve are per clone.
#[derive(Debug, Clone)]
pub struct MatrixLca {
    activities: Arc<IndexMap<NodeId, usize>>,
    flows: Arc<IndexMap<NodeId, usize>>,
    technosphere: Arc<DMatrix<f64>>,
    biosphere: Arc<DMatrix<f64>>,
    characterization: DVector<f64>,
    /// `Bᵀ c`: characterized score of one unit of each activity's own exchanges.
    unit_scores: DVector<f64>,
    factorized: Option<Arc<LU<f64, Dyn, Dyn>>>,
    supply: DVector<f64>,
    score: f64,
}

impl MatrixLca {
    /// Assembles the matrices of every activity in the registry for one method.
    pub fn new(registry: &Registry, method: &MethodKey) -> Result<Self, AnalysisError> {
        let factors = registry.method(method)?;

        let activities: IndexMap<NodeId, usize> =
            registry.activities().enumerate().map(|(i, id)| (id, i)).collect();
        let flows: IndexMap<NodeId, usize> =
            registry.flows().enumerate().map(|(i, id)| (id, i)).collect();

        let n = activities.len();
        let mut technosphere = DMatrix::<f64>::zeros(n, n);
        let mut biosphere = DMatrix::<f64>::zeros(flows.len(), n);
        let mut has_production = vec![false; n];

        for (&node, &col) in &activities {
            for exc in registry.exchanges(node, ExchangeFilter::All) {
                match exc.kind {
                    ExchangeKind::Production => {
                        if let Some(&row) = activities.get(&exc.input) {
                            technosphere[(row, col)] += exc.amount;
                            has_production[col] = true;
                        }
                    }
                    ExchangeKind::Technosphere => {
                        if let Some(&row) = activities.get(&exc.input) {
                            technosphere[(row, col)] -= exc.amount;
                        }
                    }
                    ExchangeKind::Biosphere => {
                        if let Some(&row) = flows.get(&exc.input) {
                            biosphere[(row, col)] += exc.amount;
                        }
                    }
                }
            }
        }

        // Activities without an explicit production exchange produce one unit.
        for (col, produced) in has_production.iter().enumerate() {
            if !produced {
                technosphere[(col, col)] += 1.0;
            }
        }

        let mut characterization = DVector::<f64>::zeros(flows.len());
        for (flow, cf) in factors {
            if let Some(&row) = flows.get(flow) {
                characterization[row] += *cf;
            }
        }
        let unit_scores = biosphere.tr_mul(&characterization);

        debug!(activities = n, flows = flows.len(), method = %method, "Assembled LCA matrices");

        Ok(Self {
            activities: Arc::new(activities),
            flows: Arc::new(flows),
            technosphere: Arc::new(technosphere),
            biosphere: Arc::new(biosphere),
            characterization,
            unit_scores,
            factorized: None,
            supply: DVector::zeros(n),
            score: 0.0,
        })
    }

    /// LU-decomposes the technosphere. Later calls are no-ops.
    pub fn factorize(&mut self) -> Result<(), SolverError> {
        if self.factorized.is_some() {
            return Ok(());
        }
        let lu = DMatrix::<f64>::clone(&self.technosphere).lu();
        if !lu.is_invertible() {
            return Err(SolverError::SingularTechnosphere);
        }
        self.factorized = Some(Arc::new(lu));
        Ok(())
    }

    pub fn is_factorized(&self) -> bool { self.factorized.is_some() }

    pub fn activity_count(&self) -> usize { self.activities.len() }

    /// Supply vector of the last solve, indexed by technosphere column.
    pub fn supply(&self) -> &DVector<f64> { &self.supply }

    fn demand_vector(&self, demand: &FunctionalUnit) -> Result<DVector<f64>, SolverError> {
        if demand.is_empty() {
            return Err(SolverError::EmptyDemand);
        }
        let mut f = DVector::<f64>::zeros(self.activities.len());
        for &(node, amount) in &demand.demand {
            let idx = self.activities.get(&node).ok_or(SolverError::UnknownActivity { node })?;
            f[*idx] += amount;
        }
        Ok(f)
    }
}

impl LcaSolver for MatrixLca {
    fn solve(&mut self, demand: &FunctionalUnit) -> Result<f64, SolverError> {
        self.factorize()?;
        self.rescale(demand)
    }

    fn rescale(&mut self, demand: &FunctionalUnit) -> Result<f64, SolverError> {
        let f = self.demand_vector(demand)?;
        let lu = self.factorized.as_ref().ok_or(SolverError::NotFactorized)?;
        self.supply = lu.solve(&f).ok_or(SolverError::SingularTechnosphere)?;
        self.score = self.unit_scores.dot(&self.supply);
        Ok(self.score)
    }

    fn score(&self) -> f64 { self.score }

    fn activity_scores(&self) -> Vec<f64> {
        self.unit_scores.component_mul(&self.supply).iter().copied().collect()
    }

    fn characterized_flows(&self) -> Vec<(NodeId, f64)> {
        let inventory = &*self.biosphere * &self.supply;
        self.flows
            .iter()
            .map(|(&node, &row)| (node, self.characterization[row] * inventory[row]))
            .collect()
    }

    fn technosphere_row_index(&self, node: NodeId) -> Option<usize> {
        self.activities.get(&node).copied()
    }
}
