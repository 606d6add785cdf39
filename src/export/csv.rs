//! CSV sink.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{Record, Resource};
use crate::error::Error;

use super::Exporter;

pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Exporter for CsvExporter {
    fn save(&mut self, _resource: Resource, records: &[Record]) -> Result<usize, Error> {
        let mut file = File::create(&self.path).map_err(|e| {
            Error::Export(format!("cannot create CSV '{}': {e}", self.path.display()))
        })?;

        writeln!(file, "date,duration_secs,value,tariff")
            .map_err(|e| Error::Export(format!("cannot write CSV header: {e}")))?;

        for r in records {
            writeln!(
                file,
                "{},{},{},{}",
                r.timestamp.format("%Y-%m-%dT%H:%M:%S"),
                r.duration_secs,
                r.value,
                r.tariff.map(|t| t.label()).unwrap_or(""),
            )
            .map_err(|e| Error::Export(format!("cannot write CSV row: {e}")))?;
        }

        info!(points = records.len(), path = %self.path.display(), "csv export complete");
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn rows_carry_iso_timestamps_and_tariff_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let records = vec![Record {
            timestamp: NaiveDate::from_ymd_opt(2019, 11, 11)
                .unwrap()
                .and_hms_opt(0, 30, 0)
                .unwrap(),
            duration_secs: 1800,
            value: 4.154,
            tariff: Some(crate::domain::Tariff::OffPeak),
        }];

        let written = CsvExporter::new(&path)
            .save(Resource::SubDaily, &records)
            .unwrap();
        assert_eq!(written, 1);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "date,duration_secs,value,tariff\n2019-11-11T00:30:00,1800,4.154,offpeak\n"
        );
    }
}
