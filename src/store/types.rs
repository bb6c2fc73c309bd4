use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// A stable handle to a node (process or elementary flow) inside the registry.
///
/// Alias over `petgraph::graph::NodeIndex` to abstract the underlying graph.
pub type NodeId = NodeIndex;

/// The `(database, code)` pair that identifies a dataset across databases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessKey {
    pub database: String,
    pub code: String,
}

impl ProcessKey {
    pub fn new(database: impl Into<String>, code: impl Into<String>) -> Self {
        Self { database: database.into(), code: code.into() }
    }
}

impl fmt::Display for ProcessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.database, self.code)
    }
}

/// Name tuple of an impact assessment method, e.g. `["IPCC", "GWP100"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodKey(pub Vec<String>);

impl MethodKey {
    pub fn new<S: Into<String>>(parts: impl IntoIterator<Item = S>) -> Self {
        Self(parts.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Whether a node produces something (a process) or is an elementary flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Process,
    Emission,
}

/// The semantic type of an exchange between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    /// The reference product of the consuming activity.
    Production,
    /// An input from another activity.
    Technosphere,
    /// An elementary flow exchanged with the environment.
    Biosphere,
}

impl ExchangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Production => "production",
            ExchangeKind::Technosphere => "technosphere",
            ExchangeKind::Biosphere => "biosphere",
        }
    }
}

/// Edge weight: a per-unit-of-output amount of the input node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exchange {
    pub amount: f64,
    pub kind: ExchangeKind,
}

/// A dataset: an activity or an elementary flow.
///
/// Optional metadata stays `None` (or empty) when absent; display code
/// renders those as `None` instead of failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessNode {
    pub key: ProcessKey,
    pub name: String,
    pub kind: NodeKind,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub categories: SmallVec<[String; 2]>,
}

impl Default for ProcessKey {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl ProcessNode {
    pub fn process(key: ProcessKey, name: impl Into<String>) -> Self {
        Self { key, name: name.into(), ..Default::default() }
    }

    pub fn emission(key: ProcessKey, name: impl Into<String>) -> Self {
        Self { key, name: name.into(), kind: NodeKind::Emission, ..Default::default() }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_categories<S: Into<String>>(mut self, categories: impl IntoIterator<Item = S>) -> Self {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }
}
