//! InfluxDB sink speaking the v1 line protocol over HTTP.

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::config::InfluxdbConfig;
use crate::domain::{Record, Resource};
use crate::error::Error;

use super::Exporter;

pub struct InfluxdbExporter {
    client: Client,
    write_url: String,
    database: String,
    username: Option<String>,
    password: Option<String>,
    prefix: String,
    batchid: u64,
}

impl InfluxdbExporter {
    pub fn new(config: &InfluxdbConfig) -> Result<Self, Error> {
        Ok(Self {
            client: Client::builder().build()?,
            write_url: format!("http://{}:{}/write", config.host, config.port),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            prefix: config.measurement_prefix.clone(),
            batchid: 0,
        })
    }
}

impl Exporter for InfluxdbExporter {
    fn save(&mut self, resource: Resource, records: &[Record]) -> Result<usize, Error> {
        if records.is_empty() {
            return Ok(0);
        }

        let measurement = format!("{}{}", self.prefix, resource.label());
        let body = records
            .iter()
            .map(|r| line(&measurement, self.batchid, r))
            .collect::<Vec<_>>()
            .join("\n");
        debug!(points = records.len(), url = %self.write_url, "writing line protocol batch");

        let mut req = self
            .client
            .post(&self.write_url)
            .query(&[("db", self.database.as_str()), ("precision", "s")]);
        if let Some(username) = &self.username {
            req = req.basic_auth(username, self.password.as_deref());
        }
        let resp = req.body(body).send()?;

        if !resp.status().is_success() {
            return Err(Error::Export(format!(
                "influxdb write failed with status {}",
                resp.status()
            )));
        }

        info!(points = records.len(), measurement, "influxdb write complete");
        Ok(records.len())
    }
}

/// Render one record as a line-protocol point.
///
/// Values arrive in kW and are stored in W; the tariff period, when present,
/// becomes a `type` tag.
fn line(measurement: &str, batchid: u64, record: &Record) -> String {
    let mut tags = format!("batchid={batchid}");
    if let Some(tariff) = record.tariff {
        tags.push_str(",type=");
        tags.push_str(tariff.label());
    }
    format!(
        "{},{} value={},duration={} {}",
        escape_key(measurement),
        tags,
        record.value * 1000.0,
        record.duration_secs,
        record.timestamp.and_utc().timestamp(),
    )
}

/// Escape measurement names per the line protocol (commas and spaces).
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}
