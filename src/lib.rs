// Library root: score decomposition and contribution analysis for LCA
// process databases. The optional `python` feature adds the `_core`
// extension module on top of the same API.

pub mod analysis;
pub mod analyzer;
pub mod compute;
pub mod config;
pub mod display;
pub mod error;
pub mod solver;
pub mod store;

#[cfg(feature = "python")]
pub mod bindings;

pub use analyzer::Analyzer;
pub use compute::{ContributionMatrix, ContributionReport, EmissionGroups, EmissionKey, TraversalOptions, VisitRecord};
pub use config::AnalysisSettings;
pub use error::{AnalysisError, SolverError};
pub use solver::{FunctionalUnit, LcaSolver, MatrixLca};
pub use store::{MethodKey, ProcessKey, Registry};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Defines the `_core` Python module.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<bindings::python::PyRegistry>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
