//! The process database: datasets, exchanges and impact assessment methods.
pub mod loader;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use registry::{ExchangeEdge, ExchangeFilter, Registry};
pub use types::{Exchange, ExchangeKind, MethodKey, NodeId, NodeKind, ProcessKey, ProcessNode};
