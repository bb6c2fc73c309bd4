use super::types::*;
use crate::error::AnalysisError;
use indexmap::IndexMap;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use smallvec::SmallVec;

/// Selects which exchanges of a node are returned by [`Registry::exchanges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeFilter {
    Only(ExchangeKind),
    All,
}

impl ExchangeFilter {
    fn accepts(&self, kind: ExchangeKind) -> bool {
        match self {
            ExchangeFilter::Only(k) => *k == kind,
            ExchangeFilter::All => true,
        }
    }
}

impl From<ExchangeKind> for ExchangeFilter {
    fn from(kind: ExchangeKind) -> Self {
        ExchangeFilter::Only(kind)
    }
}

/// One exchange as seen from the consuming activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeEdge {
    /// The consuming activity.
    pub output: NodeId,
    /// The supplier (activity or elementary flow).
    pub input: NodeId,
    pub amount: f64,
    pub kind: ExchangeKind,
}

impl ExchangeEdge {
    pub fn is_loop(&self) -> bool {
        self.input == self.output
    }
}

/// Read-only process database shared by every analysis.
///
/// Nodes from all databases live in one directed graph; edges point from the
/// consuming activity to its input, so an activity's exchanges are its
/// outgoing edges.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    graph: DiGraph<ProcessNode, Exchange>,
    lookup: IndexMap<ProcessKey, NodeId>,
    databases: IndexMap<String, Vec<NodeId>>,
    methods: IndexMap<MethodKey, Vec<(NodeId, f64)>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.graph.node_count() }

    /// Registers a database name; re-registering keeps existing datasets.
    pub fn add_database(&mut self, name: impl Into<String>) {
        self.databases.entry(name.into()).or_default();
    }

    /// Inserts a dataset, replacing the node data if the key already exists.
    pub fn add_node(&mut self, node: ProcessNode) -> NodeId {
        if let Some(&id) = self.lookup.get(&node.key) {
            self.graph[id] = node;
            return id;
        }
        let key = node.key.clone();
        let id = self.graph.add_node(node);
        self.databases.entry(key.database.clone()).or_default().push(id);
        self.lookup.insert(key, id);
        id
    }

    pub fn add_exchange(&mut self, output: NodeId, input: NodeId, amount: f64, kind: ExchangeKind) {
        self.graph.add_edge(output, input, Exchange { amount, kind });
    }

    pub fn add_method(&mut self, key: MethodKey, factors: Vec<(NodeId, f64)>) {
        self.methods.insert(key, factors);
    }

    // --- Lookups ---

    pub fn node(&self, id: NodeId) -> &ProcessNode { &self.graph[id] }

    pub fn find(&self, key: &ProcessKey) -> Option<NodeId> {
        self.lookup.get(key).copied()
    }

    pub fn get(&self, database: &str, code: &str) -> Result<NodeId, AnalysisError> {
        self.find(&ProcessKey::new(database, code))
            .ok_or_else(|| AnalysisError::UnknownProcess { database: database.into(), code: code.into() })
    }

    pub fn has_database(&self, name: &str) -> bool { self.databases.contains_key(name) }
    pub fn has_method(&self, key: &MethodKey) -> bool { self.methods.contains_key(key) }

    pub fn database_names(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }

    /// Datasets of one database in insertion order.
    pub fn all_node_keys(&self, database: &str) -> Result<&[NodeId], AnalysisError> {
        self.databases
            .get(database)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalysisError::UnknownDatabase(database.to_string()))
    }

    pub fn method(&self, key: &MethodKey) -> Result<&[(NodeId, f64)], AnalysisError> {
        self.methods
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalysisError::UnknownMethod(key.to_string()))
    }

    /// Process nodes of every database, in registry order.
    pub fn activities(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().filter(|&id| self.graph[id].kind == NodeKind::Process)
    }

    /// Elementary flows of every database, in registry order.
    pub fn flows(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().filter(|&id| self.graph[id].kind == NodeKind::Emission)
    }

    /// Exchanges of `node` in the order they were stored.
    pub fn exchanges(&self, node: NodeId, filter: impl Into<ExchangeFilter>) -> Vec<ExchangeEdge> {
        let filter = filter.into();
        // petgraph walks adjacency newest-first; edge indices restore insertion order.
        let mut edges: Vec<_> = self.graph
            .edges_directed(node, Direction::Outgoing)
            .filter(|e| filter.accepts(e.weight().kind))
            .collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter()
            .map(|e| ExchangeEdge {
                output: e.source(),
                input: e.target(),
                amount: e.weight().amount,
                kind: e.weight().kind,
            })
            .collect()
    }

    // --- Display ---

    pub fn display_name(&self, node: NodeId) -> &str { &self.graph[node].name }

    /// `(unit, location, categories)`, each rendered as `None` when absent.
    pub fn display_metadata(&self, node: NodeId) -> SmallVec<[String; 3]> {
        let n = &self.graph[node];
        let categories = if n.categories.is_empty() {
            "None".to_string()
        } else if n.categories.len() == 1 {
            format!("('{}',)", n.categories[0])
        } else {
            let quoted: Vec<String> = n.categories.iter().map(|c| format!("'{}'", c)).collect();
            format!("({})", quoted.join(", "))
        };
        smallvec::smallvec![
            n.unit.clone().unwrap_or_else(|| "None".into()),
            n.location.clone().unwrap_or_else(|| "None".into()),
            categories,
        ]
    }

    /// `'name' (unit, location, categories)`
    pub fn describe(&self, node: NodeId) -> String {
        format!("'{}' ({})", self.display_name(node), self.display_metadata(node).join(", "))
    }

    pub(crate) fn graph(&self) -> &DiGraph<ProcessNode, Exchange> { &self.graph }
}
