//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and initializes logging
//! - assembles the immutable runtime configuration
//! - builds the selected sink
//! - hands off to the one-shot or incremental pipeline

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, CommonArgs, SinkCommand};
use crate::config::Config;
use crate::error::Error;
use crate::export::{CsvExporter, Exporter, InfluxdbExporter, StdoutExporter};

pub mod pipeline;

/// Entry point for the `linky` binary.
pub fn run() -> Result<(), Error> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fetch(args) => pipeline::run_fetch(&args),
        Command::Sync(args) => pipeline::run_sync(&args),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Assemble the immutable configuration: defaults, file, environment, flags.
pub fn assemble_config(common: &CommonArgs) -> Result<Config, Error> {
    let mut config = Config::default();
    if let Some(path) = &common.config {
        config.load_file(path)?;
    }
    config.apply_env();

    if let Some(username) = &common.username {
        config.enedis.username = Some(username.clone());
    }
    if let Some(password) = &common.password {
        config.enedis.password = Some(password.clone());
    }
    if !common.timesheets.is_empty() {
        config.enedis.timesheets = common.timesheets.clone();
    }
    Ok(config)
}

/// Build the sink selected on the command line.
pub fn build_sink(sink: &SinkCommand, config: &Config) -> Result<Box<dyn Exporter>, Error> {
    match sink {
        SinkCommand::Influxdb(args) => {
            let mut influx = config.influxdb.clone();
            if let Some(host) = &args.host {
                influx.set_host(host)?;
            }
            if let Some(database) = &args.database {
                influx.database = database.clone();
            }
            if let Some(username) = &args.dbuser {
                influx.username = Some(username.clone());
            }
            if let Some(password) = &args.dbpassword {
                influx.password = Some(password.clone());
            }
            if let Some(prefix) = &args.prefix {
                influx.measurement_prefix = prefix.clone();
            }
            Ok(Box::new(InfluxdbExporter::new(&influx)?))
        }
        SinkCommand::Csv(args) => Ok(Box::new(CsvExporter::new(&args.output))),
        SinkCommand::Stdout(args) => Ok(Box::new(StdoutExporter::new(args.pretty))),
    }
}
