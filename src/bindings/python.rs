use crate::analyzer::Analyzer;
use crate::config::{AnalysisSettings, TreeSettings};
use crate::error::AnalysisError;
use crate::store::{MethodKey, ProcessKey, Registry};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;

fn py_err(e: AnalysisError) -> PyErr {
    match e {
        AnalysisError::UnknownDatabase(_)
        | AnalysisError::UnknownMethod(_)
        | AnalysisError::EmptyDatabase(_)
        | AnalysisError::UnknownProcess { .. }
        | AnalysisError::InvalidFixture(_)
        | AnalysisError::Json(_) => PyValueError::new_err(e.to_string()),
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

#[pyclass(name = "_Registry")]
#[derive(Debug, Default)]
pub struct PyRegistry {
    registry: Registry,
    settings: AnalysisSettings,
}

impl PyRegistry {
    fn analyzer(&self) -> Analyzer<'_> {
        Analyzer::new(&self.registry).with_settings(self.settings.clone())
    }
}

#[pymethods]
impl PyRegistry {
    #[new]
    pub fn new() -> Self { Self::default() }

    #[staticmethod]
    pub fn from_json(json: &str) -> PyResult<Self> {
        let registry = Registry::from_json_str(json).map_err(py_err)?;
        Ok(Self { registry, ..Default::default() })
    }

    #[staticmethod]
    pub fn from_path(path: PathBuf) -> PyResult<Self> {
        let registry = Registry::from_path(path).map_err(py_err)?;
        Ok(Self { registry, ..Default::default() })
    }

    pub fn load_settings(&mut self, json: &str) -> PyResult<()> {
        self.settings = AnalysisSettings::from_json_str(json).map_err(py_err)?;
        Ok(())
    }

    #[pyo3(signature = (database, code, method, amount=1.0, max_level=3, cutoff=1e-2, tab="  "))]
    pub fn print_recursive_calculation(
        &self,
        database: &str,
        code: &str,
        method: Vec<String>,
        amount: f64,
        max_level: usize,
        cutoff: f64,
        tab: &str,
    ) -> PyResult<String> {
        let mut settings = self.settings.clone();
        settings.calculation = TreeSettings { max_level, cutoff, tab: tab.into() };
        Analyzer::new(&self.registry)
            .with_settings(settings)
            .recursive_calculation_string(&ProcessKey::new(database, code), &MethodKey(method), amount)
            .map_err(py_err)
    }

    #[pyo3(signature = (database, code, amount=1.0, max_level=2, cutoff=0.0, tab="  "))]
    pub fn print_recursive_supply_chain(
        &self,
        database: &str,
        code: &str,
        amount: f64,
        max_level: usize,
        cutoff: f64,
        tab: &str,
    ) -> PyResult<String> {
        let mut settings = self.settings.clone();
        settings.supply_chain = TreeSettings { max_level, cutoff, tab: tab.into() };
        Analyzer::new(&self.registry)
            .with_settings(settings)
            .recursive_supply_chain_string(&ProcessKey::new(database, code), amount)
            .map_err(py_err)
    }

    /// `(rows, {(database, code): index}, elapsed_seconds)`
    pub fn contribution_for_all_datasets_one_method(
        &self,
        py: Python<'_>,
        database: &str,
        method: Vec<String>,
    ) -> PyResult<(Vec<Vec<f64>>, HashMap<(String, String), usize>, f64)> {
        let analyzer = self.analyzer();
        let method = MethodKey(method);
        let report = py
            .detach(|| analyzer.compute_contribution_matrix(database, &method))
            .map_err(py_err)?;
        let rows = report.matrix.to_rows();
        let (_, lookup, elapsed) = report.into_parts();
        let lookup = lookup.into_iter().map(|(k, i)| ((k.database, k.code), i)).collect();
        Ok((rows, lookup, elapsed))
    }

    /// `[((name, category, unit), [values...]), ...]` in first-seen order.
    pub fn group_by_emissions(&self, method: Vec<String>) -> PyResult<Vec<((String, String, String), Vec<f64>)>> {
        let groups = self.analyzer().group_emissions(&MethodKey(method)).map_err(py_err)?;
        Ok(groups.into_iter().map(|(k, v)| ((k.name, k.category, k.unit), v)).collect())
    }

    /// Selected exchanges as a JSON table.
    #[pyo3(signature = (database, code, max_level=1))]
    pub fn select_parameters(&self, database: &str, code: &str, max_level: usize) -> PyResult<String> {
        let mut settings = self.settings.clone();
        settings.parameters.max_level = max_level;
        let analyzer = Analyzer::new(&self.registry).with_settings(settings);
        analyzer
            .select_parameters(&ProcessKey::new(database, code))
            .and_then(|table| table.to_json())
            .map_err(py_err)
    }

    pub fn supply_loops(&self) -> Vec<Vec<(String, String)>> {
        self.analyzer()
            .supply_loops()
            .into_iter()
            .map(|component| component.into_iter().map(|k| (k.database, k.code)).collect())
            .collect()
    }

    pub fn node_count(&self) -> usize { self.registry.count() }
}
