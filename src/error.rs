//! Error types shared by the store, solver and analysis layers.
use crate::store::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Technosphere matrix has not been factorized")]
    NotFactorized,
    #[error("Technosphere matrix is singular")]
    SingularTechnosphere,
    #[error("Node {node:?} is not an activity in the technosphere")]
    UnknownActivity { node: NodeId },
    #[error("Functional unit is empty")]
    EmptyDemand,
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Can't find database {0}")]
    UnknownDatabase(String),
    #[error("Can't find method {0}")]
    UnknownMethod(String),
    #[error("Database {0} appears to have no datasets")]
    EmptyDatabase(String),
    #[error("Can't find dataset ({database}, {code})")]
    UnknownProcess { database: String, code: String },
    #[error("Solver failed: {0}")]
    Solver(#[from] SolverError),
    #[error("Analysis cancelled")]
    Cancelled,
    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
