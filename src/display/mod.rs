//! Text rendering of analysis results.
pub mod number;
pub mod tree;

pub use tree::{TreeFormatter, CALCULATION_HEADER};
