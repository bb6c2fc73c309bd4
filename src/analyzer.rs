//! Entry points that tie the registry, a solver and the analyses together.
//!
//! Every call builds its own [`MatrixLca`] for the requested method, so
//! analyses never share solver state.

use crate::analysis::parameters::select_by_supply_chain_level;
use crate::analysis::{topology, ParameterTable};
use crate::compute::emissions::{group_characterized_result, group_method_factors};
use crate::compute::{ContributionReport, ContributionSweep, EmissionGroups, GraphWalker, SupplyChain, TraversalOptions, VisitRecord};
use crate::config::AnalysisSettings;
use crate::display::TreeFormatter;
use crate::error::AnalysisError;
use crate::solver::{FunctionalUnit, LcaSolver, MatrixLca};
use crate::store::{MethodKey, NodeId, ProcessKey, Registry};
use std::io::Write;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Analyzer<'a> {
    registry: &'a Registry,
    settings: AnalysisSettings,
}

impl<'a> Analyzer<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry, settings: AnalysisSettings::default() }
    }

    pub fn with_settings(mut self, settings: AnalysisSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &AnalysisSettings { &self.settings }
    pub fn registry(&self) -> &'a Registry { self.registry }

    fn resolve(&self, key: &ProcessKey) -> Result<NodeId, AnalysisError> {
        self.registry.get(&key.database, &key.code)
    }

    fn solved(&self, root: NodeId, amount: f64, method: &MethodKey) -> Result<(MatrixLca, f64), AnalysisError> {
        let mut lca = MatrixLca::new(self.registry, method)?;
        let score = lca.solve(&FunctionalUnit::single(root, amount))?;
        Ok((lca, score))
    }

    /// Recursive score decomposition of `amount` units of `root`, in print order.
    pub fn compute_tree(
        &self,
        root: &ProcessKey,
        amount: f64,
        method: &MethodKey,
        options: TraversalOptions,
    ) -> Result<Vec<VisitRecord>, AnalysisError> {
        let root = self.resolve(root)?;
        let (mut lca, score) = self.solved(root, amount, method)?;
        let mut walker = GraphWalker::new(self.registry, &mut lca, options);
        let records = walker.traverse(root, amount, score).collect();
        records
    }

    /// Writes the calculation tree with the `calculation` settings. Returns the
    /// number of records written; nothing, not even the header, on an empty walk.
    pub fn print_recursive_calculation<W: Write>(
        &self,
        root: &ProcessKey,
        method: &MethodKey,
        amount: f64,
        out: &mut W,
    ) -> Result<usize, AnalysisError> {
        let tree = &self.settings.calculation;
        let root = self.resolve(root)?;
        let (mut lca, score) = self.solved(root, amount, method)?;
        let mut walker = GraphWalker::new(self.registry, &mut lca, tree.options());
        TreeFormatter::new(self.registry)
            .with_tab(tree.tab.as_str())
            .write_calculation(walker.traverse(root, amount, score), out)
    }

    pub fn recursive_calculation_string(
        &self,
        root: &ProcessKey,
        method: &MethodKey,
        amount: f64,
    ) -> Result<String, AnalysisError> {
        let mut out = Vec::new();
        self.print_recursive_calculation(root, method, amount, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Writes the amount-only supply chain with the `supply_chain` settings.
    pub fn print_recursive_supply_chain<W: Write>(
        &self,
        root: &ProcessKey,
        amount: f64,
        out: &mut W,
    ) -> Result<usize, AnalysisError> {
        let tree = &self.settings.supply_chain;
        let root = self.resolve(root)?;
        TreeFormatter::new(self.registry)
            .with_tab(tree.tab.as_str())
            .write_supply_chain(SupplyChain::new(self.registry, root, amount, tree.options()), out)
    }

    pub fn recursive_supply_chain_string(&self, root: &ProcessKey, amount: f64) -> Result<String, AnalysisError> {
        let mut out = Vec::new();
        self.print_recursive_supply_chain(root, amount, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// One normalized column per dataset of `database`.
    ///
    /// The database and method are validated before anything is solved; the
    /// technosphere is factorized once and reused for every root.
    pub fn compute_contribution_matrix(
        &self,
        database: &str,
        method: &MethodKey,
    ) -> Result<ContributionReport, AnalysisError> {
        if !self.registry.has_database(database) {
            return Err(AnalysisError::UnknownDatabase(database.to_string()));
        }
        if !self.registry.has_method(method) {
            return Err(AnalysisError::UnknownMethod(method.to_string()));
        }
        if self.registry.all_node_keys(database)?.is_empty() {
            return Err(AnalysisError::EmptyDatabase(database.to_string()));
        }

        debug!(database, method = %method, parallel = self.settings.sweep.parallel, "Validated contribution sweep");
        let mut lca = MatrixLca::new(self.registry, method)?;
        lca.factorize()?;
        let sweep = ContributionSweep::new(self.registry, database);
        if self.settings.sweep.parallel {
            sweep.run_parallel(&lca)
        } else {
            sweep.run(&mut lca)
        }
    }

    /// Characterization factors of `method` grouped by emission.
    pub fn group_emissions(&self, method: &MethodKey) -> Result<EmissionGroups, AnalysisError> {
        group_method_factors(self.registry, method)
    }

    /// Characterized inventory of `amount` units of `root` grouped by emission.
    pub fn group_result_emissions(
        &self,
        root: &ProcessKey,
        amount: f64,
        method: &MethodKey,
    ) -> Result<EmissionGroups, AnalysisError> {
        let (lca, _) = self.solved(self.resolve(root)?, amount, method)?;
        Ok(group_characterized_result(self.registry, &lca))
    }

    /// Perturbable exchanges within `parameters.max_level` levels of `root`.
    pub fn select_parameters(&self, root: &ProcessKey) -> Result<ParameterTable, AnalysisError> {
        let root = self.resolve(root)?;
        let selected = select_by_supply_chain_level(self.registry, root, self.settings.parameters.max_level);
        Ok(ParameterTable::from_exchanges(self.registry, &selected))
    }

    /// Technosphere loops, as dataset keys.
    pub fn supply_loops(&self) -> Vec<Vec<ProcessKey>> {
        topology::supply_loops(self.registry)
            .into_iter()
            .map(|component| component.into_iter().map(|n| self.registry.node(n).key.clone()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;
    use crate::store::fixtures;

    fn key(code: &str) -> ProcessKey {
        ProcessKey::new("a", code)
    }

    fn with(f: impl FnOnce(&mut AnalysisSettings)) -> AnalysisSettings {
        let mut settings = AnalysisSettings::default();
        f(&mut settings);
        settings
    }

    #[test]
    fn test_print_recursive_calculation_defaults() {
        let reg = fixtures::recursive_registry();
        let text = Analyzer::new(&reg).recursive_calculation_string(&key("1"), &fixtures::method(), 1.0).unwrap();
        let expected = "\
Fraction of score | Absolute score | Amount | Activity
0001 | 4.836 |     1 | 'process 1' (b, c, None)
  0.586 | 2.836 |   0.8 | 'process 2' (b, c, None)
    0.504 | 2.436 |  0.48 | 'process 3' (b, c, None)
      0.499 | 2.412 | 0.048 | 'process 5' (b, c, None)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_print_recursive_calculation_amount_and_depth() {
        let reg = fixtures::recursive_registry();
        let analyzer = Analyzer::new(&reg).with_settings(with(|s| s.calculation.max_level = 1));
        let text = analyzer.recursive_calculation_string(&key("1"), &fixtures::method(), 2.0).unwrap();
        let expected = "\
Fraction of score | Absolute score | Amount | Activity
0001 | 9.671 |     2 | 'process 1' (b, c, None)
  0.586 | 5.671 |   1.6 | 'process 2' (b, c, None)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_print_recursive_calculation_low_cutoff() {
        let reg = fixtures::recursive_registry();
        let analyzer = Analyzer::new(&reg).with_settings(with(|s| s.calculation.cutoff = 0.00025));
        let text = analyzer.recursive_calculation_string(&key("1"), &fixtures::method(), 1.0).unwrap();
        let expected = "\
Fraction of score | Absolute score | Amount | Activity
0001 | 4.836 |     1 | 'process 1' (b, c, None)
  0.586 | 2.836 |   0.8 | 'process 2' (b, c, None)
    0.504 | 2.436 |  0.48 | 'process 3' (b, c, None)
      0.00496 | 0.024 |   4.8 | 'process 4' (b, c, None)
      0.499 | 2.412 | 0.048 | 'process 5' (b, c, None)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_print_recursive_calculation_custom_tab() {
        let reg = fixtures::recursive_registry();
        let analyzer = Analyzer::new(&reg).with_settings(with(|s| {
            s.calculation.max_level = 1;
            s.calculation.tab = "🐎".into();
        }));
        let text = analyzer.recursive_calculation_string(&key("1"), &fixtures::method(), 1.0).unwrap();
        assert_eq!(text.lines().last(), Some("🐎0.586 | 2.836 |   0.8 | 'process 2' (b, c, None)"));
    }

    #[test]
    fn test_print_recursive_supply_chain() {
        let reg = fixtures::recursive_registry();
        let analyzer = Analyzer::new(&reg);
        assert_eq!(
            analyzer.recursive_supply_chain_string(&key("1"), 1.0).unwrap(),
            "1: 'process 1' (b, c, None)\n  0.8: 'process 2' (b, c, None)\n    0.48: 'process 3' (b, c, None)\n"
        );
        assert_eq!(
            analyzer.recursive_supply_chain_string(&key("1"), 2.0).unwrap(),
            "2: 'process 1' (b, c, None)\n  1.6: 'process 2' (b, c, None)\n    0.96: 'process 3' (b, c, None)\n"
        );
    }

    #[test]
    fn test_print_recursive_supply_chain_cutoff() {
        let reg = fixtures::recursive_registry();
        let analyzer = Analyzer::new(&reg).with_settings(with(|s| {
            s.supply_chain.max_level = 5;
            s.supply_chain.cutoff = 0.05;
        }));
        let expected = "\
1: 'process 1' (b, c, None)
  0.8: 'process 2' (b, c, None)
    0.48: 'process 3' (b, c, None)
      4.8: 'process 4' (b, c, None)
";
        assert_eq!(analyzer.recursive_supply_chain_string(&key("1"), 1.0).unwrap(), expected);

        let analyzer = Analyzer::new(&reg).with_settings(with(|s| s.supply_chain.max_level = 5));
        let expected = "\
1: 'process 1' (b, c, None)
  0.8: 'process 2' (b, c, None)
    0.48: 'process 3' (b, c, None)
      4.8: 'process 4' (b, c, None)
      0.048: 'process 5' (b, c, None)
        0.0024: 'process 1' (b, c, None)
          0.00192: 'process 2' (b, c, None)
";
        assert_eq!(analyzer.recursive_supply_chain_string(&key("1"), 1.0).unwrap(), expected);
    }

    #[test]
    fn test_compute_tree_matches_print() {
        let reg = fixtures::recursive_registry();
        let records = Analyzer::new(&reg)
            .compute_tree(&key("1"), 1.0, &fixtures::method(), TraversalOptions { max_level: 1, cutoff: 0.01 })
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, 0);
        assert_eq!(records[0].fraction, 1.0);
        assert!((records[1].fraction - 0.5864013266998341).abs() < 1e-9);
    }

    #[test]
    fn test_compute_tree_rejects_flows_as_roots() {
        let reg = fixtures::recursive_registry();
        let err = Analyzer::new(&reg)
            .compute_tree(&ProcessKey::new("bio", "1"), 1.0, &fixtures::method(), TraversalOptions { max_level: 1, cutoff: 0.0 })
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Solver(SolverError::UnknownActivity { .. })));
    }

    #[test]
    fn test_contribution_matrix_sequential_and_parallel_agree() {
        let reg = fixtures::recursive_registry();
        let sequential = Analyzer::new(&reg).compute_contribution_matrix("a", &fixtures::method()).unwrap();
        let parallel = Analyzer::new(&reg)
            .with_settings(with(|s| s.sweep.parallel = true))
            .compute_contribution_matrix("a", &fixtures::method())
            .unwrap();

        assert_eq!(sequential.matrix.dimension(), 5);
        assert_eq!(sequential.matrix, parallel.matrix);
        for col in 0..5 {
            assert!((sequential.matrix.column_sum(col) - 1.0).abs() < 1e-9);
        }
        let (values, lookup, elapsed) = sequential.into_parts();
        assert_eq!(values.shape(), (5, 5));
        assert_eq!(lookup[&key("3")], 2);
        assert!(elapsed >= 0.0);
    }

    #[test]
    fn test_contribution_matrix_validates_before_solving() {
        let mut reg = fixtures::recursive_registry();
        reg.add_database("empty");
        let analyzer = Analyzer::new(&reg);

        let unknown_method = MethodKey::new(["nope"]);
        assert!(matches!(
            analyzer.compute_contribution_matrix("missing", &unknown_method),
            Err(AnalysisError::UnknownDatabase(_))
        ));
        assert!(matches!(
            analyzer.compute_contribution_matrix("empty", &unknown_method),
            Err(AnalysisError::UnknownMethod(_))
        ));
        assert!(matches!(
            analyzer.compute_contribution_matrix("empty", &fixtures::method()),
            Err(AnalysisError::EmptyDatabase(_))
        ));
    }

    #[test]
    fn test_contribution_matrix_of_flow_database_is_zero() {
        let reg = fixtures::recursive_registry();
        let report = Analyzer::new(&reg).compute_contribution_matrix("bio", &fixtures::method()).unwrap();
        assert_eq!(report.matrix.dimension(), 1);
        assert_eq!(report.matrix.column_sum(0), 0.0);
        assert_eq!(report.telemetry.failed_roots, 1);
    }

    #[test]
    fn test_singular_technosphere_fails_the_sweep() {
        let reg = fixtures::perturbation_registry();
        let err = Analyzer::new(&reg)
            .compute_contribution_matrix("foreground", &MethodKey::new(["test method"]))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Solver(SolverError::SingularTechnosphere)));
    }

    #[test]
    fn test_group_emissions_entry_points() {
        let reg = fixtures::recursive_registry();
        let analyzer = Analyzer::new(&reg);
        let factors = analyzer.group_emissions(&fixtures::method()).unwrap();
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0], vec![1.0]);

        let result = analyzer.group_result_emissions(&key("1"), 1.0, &fixtures::method()).unwrap();
        assert!((result[0][0] - 4.8356054530874095).abs() < 1e-9);
    }

    #[test]
    fn test_select_parameters_uses_configured_depth() {
        let reg = fixtures::perturbation_registry();
        let root = ProcessKey::new("foreground", "act 1");
        assert_eq!(Analyzer::new(&reg).select_parameters(&root).unwrap().len(), 6);

        let deeper = Analyzer::new(&reg).with_settings(with(|s| s.parameters.max_level = 2));
        assert_eq!(deeper.select_parameters(&root).unwrap().len(), 13);
    }

    #[test]
    fn test_supply_loops_as_keys() {
        let reg = fixtures::perturbation_registry();
        assert_eq!(Analyzer::new(&reg).supply_loops(), vec![vec![ProcessKey::new("foreground", "act 3")]]);
    }
}
