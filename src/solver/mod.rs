//! The LCA solver seam and its dense-matrix implementation.
pub mod matrix;
pub mod problem;

pub use matrix::MatrixLca;
pub use problem::{FunctionalUnit, LcaSolver};
