//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the `(year, quarter)` period key (`Period`, `Quarter`)
//! - input observations (`ObservationRecord`, `UnemploymentRecord`)
//! - recovery outputs (`RecoverySummary`, `Diagnostic`, `RecoveryReport`)
//! - run configuration (`RecoveryConfig`, `CorrelateConfig`)

pub mod period;
pub mod types;

pub use period::*;
pub use types::*;
