//! Reporting utilities: terminal tables for recovery, correlation and groups.

pub mod format;

pub use format::*;
