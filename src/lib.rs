//! `cre-recovery` library crate.
//!
//! The binary (`cre`) is a thin wrapper around this library so that:
//!
//! - the recovery calculator is testable without spawning processes
//! - the same loaded snapshot can feed several analyses
//! - presentation (tables, exports) stays separate from the metrics

pub mod analysis;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod recovery;
pub mod report;
