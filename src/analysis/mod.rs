//! Secondary analyses built on the loaded datasets.
//!
//! - occupancy vs. unemployment per market (`unemployment`)
//! - recovery averages across market groups (`groups`)

pub mod groups;
pub mod unemployment;

pub use groups::*;
pub use unemployment::*;
