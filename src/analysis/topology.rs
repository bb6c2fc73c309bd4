use crate::store::{ExchangeKind, NodeId, Registry};
use petgraph::algo::tarjan_scc;
use petgraph::visit::{EdgeFiltered, EdgeRef};

/// Groups of activities that supply each other, directly or through a chain.
///
/// Only technosphere exchanges count. A single activity is reported when it
/// consumes its own product.
pub fn supply_loops(registry: &Registry) -> Vec<Vec<NodeId>> {
    let graph = registry.graph();
    let technosphere = EdgeFiltered::from_fn(graph, |e| e.weight().kind == ExchangeKind::Technosphere);

    tarjan_scc(&technosphere)
        .into_iter()
        .filter(|component| match component.as_slice() {
            [single] => registry
                .exchanges(*single, ExchangeKind::Technosphere)
                .iter()
                .any(|e| e.is_loop()),
            _ => true,
        })
        .collect()
}
