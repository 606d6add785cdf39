//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the fixed resource-kind enumeration (`Resource`)
//! - the provider's raw payload shapes (`RawSeries`, `RawSample`)
//! - normalized output records (`Record`, `Tariff`)
//! - off-peak timesheet rules (`TimesheetRule`)

pub mod types;

pub use types::*;
