//! Structural diagnostics and sensitivity-analysis helpers over the registry.
pub mod parameters;
pub mod telemetry;
pub mod topology;

pub use parameters::{ParameterRow, ParameterScope, ParameterTable};
pub use telemetry::{ColumnOutcome, SweepTelemetry};
