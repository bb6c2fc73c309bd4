//! Groups per-flow values by `(name, primary category, unit)`.
use crate::error::AnalysisError;
use crate::solver::LcaSolver;
use crate::store::{MethodKey, NodeId, Registry};
use indexmap::IndexMap;
use serde::Serialize;

/// Missing category or unit metadata is keyed as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EmissionKey {
    pub name: String,
    pub category: String,
    pub unit: String,
}

impl EmissionKey {
    pub fn new(name: impl Into<String>, category: impl Into<String>, unit: impl Into<String>) -> Self {
        Self { name: name.into(), category: category.into(), unit: unit.into() }
    }
}

/// Values keep the order flows were visited in; keys keep first-seen order.
pub type EmissionGroups = IndexMap<EmissionKey, Vec<f64>>;

pub fn emission_key(registry: &Registry, flow: NodeId) -> EmissionKey {
    let node = registry.node(flow);
    EmissionKey {
        name: node.name.clone(),
        category: node.primary_category().unwrap_or_default().to_string(),
        unit: node.unit.clone().unwrap_or_default(),
    }
}

/// Flat pass over `(flow, value)` pairs. Zero values are kept.
pub fn group_emissions<I>(registry: &Registry, values: I) -> EmissionGroups
where
    I: IntoIterator<Item = (NodeId, f64)>,
{
    let mut groups = EmissionGroups::new();
    for (flow, value) in values {
        groups.entry(emission_key(registry, flow)).or_default().push(value);
    }
    groups
}

/// Groups a method's characterization factors.
pub fn group_method_factors(registry: &Registry, method: &MethodKey) -> Result<EmissionGroups, AnalysisError> {
    let factors = registry.method(method)?;
    Ok(group_emissions(registry, factors.iter().copied()))
}

/// Groups the characterized inventory of the solver's last solve.
pub fn group_characterized_result<S: LcaSolver>(registry: &Registry, solver: &S) -> EmissionGroups {
    group_emissions(registry, solver.characterized_flows())
}
