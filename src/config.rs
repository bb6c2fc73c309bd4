//! Analysis settings with the defaults of the print helpers.
use crate::compute::TraversalOptions;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Depth, pruning and indentation of one tree printer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSettings {
    pub max_level: usize,
    pub cutoff: f64,
    pub tab: String,
}

impl TreeSettings {
    pub fn options(&self) -> TraversalOptions {
        TraversalOptions { max_level: self.max_level, cutoff: self.cutoff }
    }

    fn calculation() -> Self {
        Self { max_level: 3, cutoff: 1e-2, tab: "  ".into() }
    }

    fn supply_chain() -> Self {
        Self { max_level: 2, cutoff: 0.0, tab: "  ".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSettings {
    pub max_level: usize,
}

impl Default for ParameterSettings {
    fn default() -> Self { Self { max_level: 1 } }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    #[serde(default = "TreeSettings::calculation")]
    pub calculation: TreeSettings,
    #[serde(default = "TreeSettings::supply_chain")]
    pub supply_chain: TreeSettings,
    pub parameters: ParameterSettings,
    pub sweep: SweepSettings,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            calculation: TreeSettings::calculation(),
            supply_chain: TreeSettings::supply_chain(),
            parameters: ParameterSettings::default(),
            sweep: SweepSettings::default(),
        }
    }
}

impl AnalysisSettings {
    /// Missing sections and fields keep their defaults. Values are not range-checked.
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_print_helpers() {
        let s = AnalysisSettings::default();
        assert_eq!(s.calculation.options(), TraversalOptions { max_level: 3, cutoff: 0.01 });
        assert_eq!(s.supply_chain.options(), TraversalOptions { max_level: 2, cutoff: 0.0 });
        assert_eq!(s.calculation.tab, "  ");
        assert_eq!(s.parameters.max_level, 1);
        assert!(!s.sweep.parallel);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let s = AnalysisSettings::from_json_str(r#"{"sweep": {"parallel": true}}"#).unwrap();
        assert!(s.sweep.parallel);
        assert_eq!(s.calculation, AnalysisSettings::default().calculation);
        assert_eq!(AnalysisSettings::from_json_str("{}").unwrap(), AnalysisSettings::default());
    }

    #[test]
    fn test_out_of_range_values_are_accepted() {
        let s = AnalysisSettings::from_json_str(
            r#"{"calculation": {"max_level": 0, "cutoff": -1.5, "tab": ""}}"#,
        )
        .unwrap();
        assert_eq!(s.calculation.max_level, 0);
        assert_eq!(s.calculation.cutoff, -1.5);
    }

    #[test]
    fn test_from_path_and_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"supply_chain": {{"max_level": 5, "cutoff": 0.05, "tab": "\t"}}}}"#).unwrap();
        let s = AnalysisSettings::from_path(file.path()).unwrap();
        assert_eq!(s.supply_chain.options(), TraversalOptions { max_level: 5, cutoff: 0.05 });
        assert_eq!(s.supply_chain.tab, "\t");

        assert!(matches!(AnalysisSettings::from_json_str("{"), Err(AnalysisError::Json(_))));
        assert!(matches!(AnalysisSettings::from_path("/no/such/settings.json"), Err(AnalysisError::Io(_))));
    }
}
