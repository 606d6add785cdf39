//! Output sinks for normalized records.
//!
//! Sinks receive fully transformed records; unit scaling and field naming
//! are sink-specific concerns, never performed by the transformer.

pub mod csv;
pub mod influxdb;
pub mod stdout;

pub use csv::CsvExporter;
pub use influxdb::InfluxdbExporter;
pub use stdout::StdoutExporter;

use crate::domain::{Record, Resource};
use crate::error::Error;

/// A destination for normalized records.
pub trait Exporter {
    /// Write the records, returning how many points were persisted.
    fn save(&mut self, resource: Resource, records: &[Record]) -> Result<usize, Error>;
}
