//! Stdout sink, for piping and quick inspection.

use crate::domain::{Record, Resource};
use crate::error::Error;

use super::Exporter;

pub struct StdoutExporter {
    pretty: bool,
}

impl StdoutExporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Exporter for StdoutExporter {
    fn save(&mut self, resource: Resource, records: &[Record]) -> Result<usize, Error> {
        if self.pretty {
            let json = serde_json::to_string_pretty(records)
                .map_err(|e| Error::Export(format!("cannot render records: {e}")))?;
            println!("{json}");
        } else {
            for r in records {
                println!(
                    "{}\t{}\t{}s\t{} kW\t{}",
                    resource.label(),
                    r.timestamp.format("%Y-%m-%dT%H:%M:%S"),
                    r.duration_secs,
                    r.value,
                    r.tariff.map(|t| t.label()).unwrap_or("-"),
                );
            }
        }
        Ok(records.len())
    }
}
