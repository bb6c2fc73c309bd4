//! Shared test fixtures.
use super::registry::Registry;
use super::types::MethodKey;

/// Five activities with one loop back to the root:
/// 1 -0.8-> 2 -0.6-> 3 -10-> 4, 3 -0.1-> 5 -0.05-> 1.
/// Direct emissions of the single flow: 2, 0.5, 0, 0.005, 50.
pub const RECURSIVE_JSON: &str = r#"{
  "databases": {
    "a": {
      "1": {"name": "process 1", "unit": "b", "location": "c", "exchanges": [
        {"input": ["a", "1"], "amount": 1.0, "type": "production"},
        {"input": ["a", "2"], "amount": 0.8, "type": "technosphere"},
        {"input": ["bio", "1"], "amount": 2.0, "type": "biosphere"}
      ]},
      "2": {"name": "process 2", "unit": "b", "location": "c", "exchanges": [
        {"input": ["a", "3"], "amount": 0.6, "type": "technosphere"},
        {"input": ["bio", "1"], "amount": 0.5, "type": "biosphere"}
      ]},
      "3": {"name": "process 3", "unit": "b", "location": "c", "exchanges": [
        {"input": ["a", "4"], "amount": 10.0, "type": "technosphere"},
        {"input": ["a", "5"], "amount": 0.1, "type": "technosphere"}
      ]},
      "4": {"name": "process 4", "unit": "b", "location": "c", "exchanges": [
        {"input": ["bio", "1"], "amount": 0.005, "type": "biosphere"}
      ]},
      "5": {"name": "process 5", "unit": "b", "location": "c", "exchanges": [
        {"input": ["a", "1"], "amount": 0.05, "type": "technosphere"},
        {"input": ["bio", "1"], "amount": 50.0, "type": "biosphere"}
      ]}
    },
    "bio": {
      "1": {"name": "bad stuff", "type": "emission", "unit": "kg", "categories": ["air"]}
    }
  },
  "methods": [{"name": ["method"], "factors": [[["bio", "1"], 1.0]]}]
}"#;

/// Foreground system used by the parameter-selection tests.
pub const PERTURBATION_JSON: &str = r#"{
  "databases": {
    "biosphere3": {
      "bio-exc1": {"name": "bio-exc1", "type": "emission", "categories": ["cat1", "cat2"]},
      "bio-exc2": {"name": "bio-exc2", "type": "emission", "categories": ["cat1", "cat2"]},
      "bio-exc3": {"name": "bio-exc3", "type": "emission", "categories": ["cat1", "cat2"]},
      "bio-exc4": {"name": "bio-exc4", "type": "emission", "categories": ["cat1", "cat2"]},
      "bio-exc5": {"name": "bio-exc5", "type": "emission", "categories": ["cat1", "cat2"]}
    },
    "foreground": {
      "act 1": {"name": "act1", "location": "GLO", "exchanges": [
        {"input": ["foreground", "act 1"], "amount": 1, "type": "production"},
        {"input": ["biosphere3", "bio-exc1"], "amount": 1, "type": "biosphere"},
        {"input": ["biosphere3", "bio-exc2"], "amount": 1, "type": "biosphere"},
        {"input": ["foreground", "act 2"], "amount": 1, "type": "technosphere"},
        {"input": ["foreground", "act 3"], "amount": 1, "type": "technosphere"},
        {"input": ["foreground", "act 3"], "amount": 2, "type": "technosphere"},
        {"input": ["foreground", "act 4"], "amount": 1, "type": "technosphere"}
      ]},
      "act 2": {"name": "act2", "location": "GLO", "exchanges": [
        {"input": ["foreground", "act 2"], "amount": 1, "type": "production"},
        {"input": ["biosphere3", "bio-exc3"], "amount": 1, "type": "biosphere"}
      ]},
      "act 3": {"name": "act3", "location": "GLO", "exchanges": [
        {"input": ["foreground", "act 3"], "amount": 1, "type": "technosphere"},
        {"input": ["biosphere3", "bio-exc4"], "amount": 1, "type": "biosphere"}
      ]},
      "act 4": {"name": "act4", "location": "GLO", "exchanges": [
        {"input": ["foreground", "act 4"], "amount": 1, "type": "production"},
        {"input": ["biosphere3", "bio-exc5"], "amount": 1, "type": "biosphere"},
        {"input": ["biosphere3", "bio-exc4"], "amount": 0, "type": "biosphere"},
        {"input": ["foreground", "act 2"], "amount": 1, "type": "technosphere"}
      ]}
    }
  },
  "methods": [{"name": ["test method"], "factors": [
    [["biosphere3", "bio-exc1"], 1], [["biosphere3", "bio-exc2"], 2],
    [["biosphere3", "bio-exc3"], 3], [["biosphere3", "bio-exc4"], 4],
    [["biosphere3", "bio-exc5"], 5]
  ]}]
}"#;

pub fn recursive_registry() -> Registry {
    Registry::from_json_str(RECURSIVE_JSON).expect("recursive fixture must load")
}

pub fn perturbation_registry() -> Registry {
    Registry::from_json_str(PERTURBATION_JSON).expect("perturbation fixture must load")
}

pub fn method() -> MethodKey {
    MethodKey::new(["method"])
}
