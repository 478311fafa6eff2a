//! Recovery metrics relative to a pre-disruption baseline.
//!
//! Every caller (CLI tables, group summaries, exports) goes through
//! `RecoveryCalculator` rather than re-deriving baseline/trough/current inline.

pub mod calculator;

pub use calculator::*;
