//! JSON fixture loader.
//!
//! The accepted shape mirrors how datasets are written to a database:
//!
//! ```json
//! {
//!   "databases": {
//!     "a": {
//!       "1": {"name": "process 1", "unit": "b", "location": "c",
//!             "exchanges": [{"input": ["a", "2"], "amount": 0.8, "type": "technosphere"}]}
//!     }
//!   },
//!   "methods": [{"name": ["method"], "factors": [[["bio", "1"], 1.0, "GLO"]]}]
//! }
//! ```
//!
//! Exchanges may point at datasets defined later in the document.

use super::registry::Registry;
use super::types::*;
use crate::error::AnalysisError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    databases: IndexMap<String, IndexMap<String, DatasetEntry>>,
    #[serde(default)]
    methods: Vec<MethodEntry>,
}

#[derive(Debug, Deserialize)]
struct DatasetEntry {
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    exchanges: Vec<ExchangeEntry>,
}

#[derive(Debug, Deserialize)]
struct ExchangeEntry {
    input: (String, String),
    amount: f64,
    #[serde(rename = "type")]
    kind: ExchangeKind,
}

#[derive(Debug, Deserialize)]
struct MethodEntry {
    name: Vec<String>,
    factors: Vec<FactorEntry>,
}

/// `[flow, cf]` or `[flow, cf, location]`; the location is not used.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FactorEntry {
    Global((String, String), f64),
    Located((String, String), f64, String),
}

impl FactorEntry {
    fn parts(&self) -> (&(String, String), f64) {
        match self {
            FactorEntry::Global(flow, cf) | FactorEntry::Located(flow, cf, _) => (flow, *cf),
        }
    }
}

impl Registry {
    pub fn from_json_str(source: &str) -> Result<Self, AnalysisError> {
        let doc: Document = serde_json::from_str(source)?;
        build(doc)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }
}

fn node_kind(kind: Option<&str>) -> NodeKind {
    match kind {
        None | Some("process") => NodeKind::Process,
        // "emission", "natural resource", ... are all elementary flows.
        Some(_) => NodeKind::Emission,
    }
}

fn resolve(registry: &Registry, (database, code): &(String, String)) -> Result<NodeId, AnalysisError> {
    registry.find(&ProcessKey::new(database.as_str(), code.as_str())).ok_or_else(|| {
        AnalysisError::InvalidFixture(format!("exchange input ({}, {}) is not defined", database, code))
    })
}

fn build(doc: Document) -> Result<Registry, AnalysisError> {
    let mut registry = Registry::new();

    // Pass 1: nodes, so exchanges can reference anything in the document.
    for (database, datasets) in &doc.databases {
        registry.add_database(database.as_str());
        for (code, entry) in datasets {
            let node = ProcessNode {
                key: ProcessKey::new(database.as_str(), code.as_str()),
                name: entry.name.clone(),
                kind: node_kind(entry.kind.as_deref()),
                unit: entry.unit.clone(),
                location: entry.location.clone(),
                categories: entry.categories.iter().cloned().collect(),
            };
            registry.add_node(node);
        }
    }

    // Pass 2: exchanges in document order.
    for (database, datasets) in &doc.databases {
        for (code, entry) in datasets {
            let output = registry.get(database, code)?;
            for exc in &entry.exchanges {
                let input = resolve(&registry, &exc.input)?;
                registry.add_exchange(output, input, exc.amount, exc.kind);
            }
        }
    }

    for method in doc.methods {
        let factors = method.factors
            .iter()
            .map(|entry| {
                let (flow, cf) = entry.parts();
                resolve(&registry, flow).map(|id| (id, cf))
            })
            .collect::<Result<Vec<_>, _>>()?;
        registry.add_method(MethodKey(method.name), factors);
    }

    Ok(registry)
}
