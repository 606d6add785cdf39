//! Runtime configuration assembled once at startup.
//!
//! Precedence, lowest to highest: built-in defaults, config file,
//! environment (credentials only, `.env`-aware), CLI flags. The assembled
//! `Config` is immutable afterwards and passed by reference into each
//! component; there is no shared mutable global.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::domain::TimesheetRule;
use crate::error::Error;

pub const ENV_USERNAME: &str = "LINKY_USERNAME";
pub const ENV_PASSWORD: &str = "LINKY_PASSWORD";

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub enedis: EnedisConfig,
    pub influxdb: InfluxdbConfig,
}

#[derive(Debug, Clone, Default)]
pub struct EnedisConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub timesheets: Vec<TimesheetRule>,
}

#[derive(Debug, Clone)]
pub struct InfluxdbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub measurement_prefix: String,
}

impl Default for InfluxdbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 8086,
            database: "linky".into(),
            username: None,
            password: None,
            measurement_prefix: "linky_".into(),
        }
    }
}

impl InfluxdbConfig {
    /// Override host (and optionally port) from a `host[:port]` spec.
    pub fn set_host(&mut self, spec: &str) -> Result<(), Error> {
        match spec.split_once(':') {
            Some((host, port)) => {
                self.host = host.to_string();
                self.port = port
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid port in '{spec}'")))?;
            }
            None => self.host = spec.to_string(),
        }
        Ok(())
    }
}

/// On-disk schema: everything optional, unknown keys ignored.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    enedis: FileEnedis,
    #[serde(default)]
    influxdb: FileInfluxdb,
}

#[derive(Debug, Default, Deserialize)]
struct FileEnedis {
    username: Option<String>,
    password: Option<String>,
    timesheets: Option<Vec<(String, String)>>,
}

#[derive(Debug, Default, Deserialize)]
struct FileInfluxdb {
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    #[serde(rename = "measurement-prefix")]
    measurement_prefix: Option<String>,
}

impl Config {
    /// Overlay values from a JSON config file.
    pub fn load_file(&mut self, path: &Path) -> Result<(), Error> {
        let file = File::open(path)?;
        let parsed: FileConfig = serde_json::from_reader(file)
            .map_err(|e| Error::Config(format!("invalid config file '{}': {e}", path.display())))?;
        debug!(path = %path.display(), "loaded config file");
        self.overlay(parsed)
    }

    fn overlay(&mut self, file: FileConfig) -> Result<(), Error> {
        if let Some(v) = file.enedis.username {
            self.enedis.username = Some(v);
        }
        if let Some(v) = file.enedis.password {
            self.enedis.password = Some(v);
        }
        if let Some(pairs) = file.enedis.timesheets {
            self.enedis.timesheets = pairs
                .iter()
                .map(|(start, end)| TimesheetRule::from_parts(start, end))
                .collect::<Result<_, _>>()?;
        }

        if let Some(v) = file.influxdb.host {
            self.influxdb.host = v;
        }
        if let Some(v) = file.influxdb.port {
            self.influxdb.port = v;
        }
        if let Some(v) = file.influxdb.database {
            self.influxdb.database = v;
        }
        if let Some(v) = file.influxdb.username {
            self.influxdb.username = Some(v);
        }
        if let Some(v) = file.influxdb.password {
            self.influxdb.password = Some(v);
        }
        if let Some(v) = file.influxdb.measurement_prefix {
            self.influxdb.measurement_prefix = v;
        }
        Ok(())
    }

    /// Overlay provider credentials from the environment (`.env`-aware).
    pub fn apply_env(&mut self) {
        dotenvy::dotenv().ok();
        if let Ok(v) = std::env::var(ENV_USERNAME) {
            self.enedis.username = Some(v);
        }
        if let Ok(v) = std::env::var(ENV_PASSWORD) {
            self.enedis.password = Some(v);
        }
    }

    /// Provider credentials, required before talking to the portal.
    pub fn require_credentials(&self) -> Result<(&str, &str), Error> {
        let username = self.enedis.username.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "missing provider username (flag --username, {ENV_USERNAME}, or config file)"
            ))
        })?;
        let password = self.enedis.password.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "missing provider password (flag --password, {ENV_PASSWORD}, or config file)"
            ))
        })?;
        Ok((username, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(json: &str) -> FileConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn file_values_override_defaults() {
        let mut config = Config::default();
        config
            .overlay(file_config(
                r#"{ "influxdb": { "host": "tsdb.local", "database": "power" },
                     "enedis": { "username": "alice", "timesheets": [["22:00", "06:00"]] } }"#,
            ))
            .unwrap();

        assert_eq!(config.influxdb.host, "tsdb.local");
        assert_eq!(config.influxdb.port, 8086);
        assert_eq!(config.influxdb.database, "power");
        assert_eq!(config.influxdb.measurement_prefix, "linky_");
        assert_eq!(config.enedis.username.as_deref(), Some("alice"));
        assert_eq!(config.enedis.timesheets.len(), 1);
    }

    #[test]
    fn malformed_file_timesheet_is_rejected() {
        let mut config = Config::default();
        let err = config
            .overlay(file_config(
                r#"{ "enedis": { "timesheets": [["22h00", "06:00"]] } }"#,
            ))
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn host_spec_may_carry_a_port() {
        let mut influx = InfluxdbConfig::default();
        influx.set_host("tsdb.local:9999").unwrap();
        assert_eq!(influx.host, "tsdb.local");
        assert_eq!(influx.port, 9999);

        influx.set_host("other").unwrap();
        assert_eq!(influx.host, "other");
        assert_eq!(influx.port, 9999);

        assert!(influx.set_host("tsdb.local:nope").is_err());
    }

    #[test]
    fn missing_credentials_are_a_config_error() {
        let config = Config::default();
        assert!(matches!(
            config.require_credentials(),
            Err(Error::Config(_))
        ));

        let mut config = Config::default();
        config.enedis.username = Some("alice".into());
        config.enedis.password = Some("secret".into());
        assert_eq!(config.require_credentials().unwrap(), ("alice", "secret"));
    }
}
