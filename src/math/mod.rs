//! Small numerical helpers.

pub mod ols;

pub use ols::*;
