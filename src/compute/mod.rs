//! Score decomposition: recursive walks, contribution matrices, emission grouping.
pub mod contribution;
pub mod emissions;
pub mod walker;

pub use contribution::{ContributionMatrix, ContributionReport, ContributionSweep};
pub use emissions::{group_emissions, EmissionGroups, EmissionKey};
pub use walker::{GraphWalker, SupplyChain, SupplyRecord, Traversal, TraversalOptions, VisitRecord};
