use crate::error::SolverError;
use crate::store::NodeId;
use smallvec::SmallVec;

/// Requested output amounts per activity, the input to every solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionalUnit {
    pub demand: SmallVec<[(NodeId, f64); 2]>,
}

impl FunctionalUnit {
    pub fn single(node: NodeId, amount: f64) -> Self {
        let mut demand = SmallVec::new();
        demand.push((node, amount));
        Self { demand }
    }

    pub fn is_empty(&self) -> bool { self.demand.is_empty() }
}

impl FromIterator<(NodeId, f64)> for FunctionalUnit {
    fn from_iter<I: IntoIterator<Item = (NodeId, f64)>>(iter: I) -> Self {
        Self { demand: iter.into_iter().collect() }
    }
}

/// The black-box LCA contract the analyses are written against.
///
/// Implementations keep a factorized technosphere between calls: `solve`
/// may factorize, `rescale` must reuse what the last factorization left.
/// Methods take `&mut self` so one traversal holds exclusive access for
/// its whole duration.
pub trait LcaSolver {
    /// Full solve for a new functional unit. Returns the total score.
    fn solve(&mut self, demand: &FunctionalUnit) -> Result<f64, SolverError>;

    /// Re-solve for a new functional unit without re-factorizing.
    fn rescale(&mut self, demand: &FunctionalUnit) -> Result<f64, SolverError>;

    /// Score of the last solve.
    fn score(&self) -> f64;

    /// Characterized score attributed to each technosphere column by the last solve.
    fn activity_scores(&self) -> Vec<f64>;

    /// Characterized score of each elementary flow from the last solve, in flow order.
    fn characterized_flows(&self) -> Vec<(NodeId, f64)>;

    /// Column of `node` in the technosphere matrix.
    fn technosphere_row_index(&self, node: NodeId) -> Option<usize>;
}
