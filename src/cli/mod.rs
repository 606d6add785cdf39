//! Command-line parsing for the Linky consumption exporter.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the fetch/transform code. The relative-duration
//! mini-grammar used by `--last` and `--retention` also lives here: it is a
//! CLI convention, not a provider format.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{Resource, TimesheetRule};
use crate::time::DateDelta;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "linky", version, about = "Linky power-consumption exporter (Enedis)")]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace); RUST_LOG overrides.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// One-shot fetch over an explicit date range.
    Fetch(FetchArgs),
    /// Incremental fetch driven by the persisted watermark.
    ///
    /// Meant to run unattended on a schedule: each run picks up exactly
    /// where the last committed run ended.
    Sync(SyncArgs),
}

/// Options shared by both run modes.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Configuration file (JSON).
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enedis account username.
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Enedis account password.
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Off-peak timesheet window (HH:MM-HH:MM, repeatable).
    #[arg(long = "timesheet", value_name = "RULE", value_parser = parse_timesheet)]
    pub timesheets: Vec<TimesheetRule>,

    /// Which consumption curve to query.
    #[arg(long, value_enum, default_value_t = Resource::SubDaily)]
    pub kind: Resource,
}

/// Options for a one-shot range fetch.
#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// End of the range, inclusive civil date (DD/MM/YYYY; default today).
    #[arg(long, value_name = "DATE", value_parser = parse_provider_date)]
    pub to: Option<NaiveDate>,

    /// Start of the range (DD/MM/YYYY).
    #[arg(long = "from", value_name = "DATE", value_parser = parse_provider_date, conflicts_with = "last")]
    pub from: Option<NaiveDate>,

    /// Relative lookback ending at --to (e.g. 1d, 3m, 1y).
    #[arg(long, value_name = "DELTA", value_parser = parse_lookback)]
    pub last: Option<DateDelta>,

    #[command(subcommand)]
    pub sink: SinkCommand,
}

/// Options for a watermark-driven incremental run.
#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Watermark state file, rewritten after each committed window.
    #[arg(long, value_name = "FILE", default_value = "linky-state.json")]
    pub state: PathBuf,

    /// Lookback bound for the very first run (provider retains about a year).
    #[arg(long, value_name = "DELTA", value_parser = parse_lookback, default_value = "1y")]
    pub retention: DateDelta,

    #[command(subcommand)]
    pub sink: SinkCommand,
}

/// Where the records go.
#[derive(Debug, Subcommand)]
pub enum SinkCommand {
    /// Export to InfluxDB.
    Influxdb(InfluxdbArgs),
    /// Export to a CSV file.
    Csv(CsvArgs),
    /// Print records to stdout.
    Stdout(StdoutArgs),
}

#[derive(Debug, Args)]
pub struct InfluxdbArgs {
    /// Database host, optionally with port (host[:port]).
    #[arg(long)]
    pub host: Option<String>,

    /// Database name.
    #[arg(long = "db")]
    pub database: Option<String>,

    /// Database username.
    #[arg(long)]
    pub dbuser: Option<String>,

    /// Database password.
    #[arg(long)]
    pub dbpassword: Option<String>,

    /// Measurement name prefix.
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Debug, Args)]
pub struct CsvArgs {
    /// Output file.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct StdoutArgs {
    /// Pretty-print records as JSON.
    #[arg(long)]
    pub pretty: bool,
}

/// Parse the relative-duration mini-grammar: `<uint><d|m|y>`.
pub fn parse_lookback(s: &str) -> Result<DateDelta, String> {
    let s = s.trim();
    let Some(unit) = s.chars().next_back() else {
        return Err("empty duration (expected e.g. 1d, 3m, 1y)".to_string());
    };
    let count: u32 = s[..s.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| format!("invalid count in '{s}' (expected e.g. 1d, 3m, 1y)"))?;
    match unit {
        'd' => Ok(DateDelta::days(i64::from(count))),
        'm' => Ok(DateDelta::months(count as i32)),
        'y' => Ok(DateDelta::years(count as i32)),
        _ => Err(format!("unknown unit '{unit}' in '{s}' (expected d, m or y)")),
    }
}

fn parse_provider_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .map_err(|e| format!("invalid date '{s}' (expected DD/MM/YYYY): {e}"))
}

fn parse_timesheet(s: &str) -> Result<TimesheetRule, String> {
    TimesheetRule::parse(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_grammar_is_uint_then_unit() {
        assert_eq!(parse_lookback("1d").unwrap(), DateDelta::days(1));
        assert_eq!(parse_lookback("3m").unwrap(), DateDelta::months(3));
        assert_eq!(parse_lookback("1y").unwrap(), DateDelta::years(1));
        assert_eq!(parse_lookback("24d").unwrap(), DateDelta::days(24));

        assert!(parse_lookback("1w").is_err());
        assert!(parse_lookback("d").is_err());
        assert!(parse_lookback("").is_err());
        assert!(parse_lookback("-1d").is_err());
    }

    #[test]
    fn fetch_command_parses_range_and_sink() {
        let cli = Cli::try_parse_from([
            "linky", "fetch", "--kind", "monthly", "--from", "01/01/2019", "--to", "01/06/2019",
            "csv", "-o", "out.csv",
        ])
        .unwrap();

        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.common.kind, Resource::Monthly);
        assert_eq!(
            args.from,
            Some(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap())
        );
        assert!(matches!(args.sink, SinkCommand::Csv(_)));
    }

    #[test]
    fn from_and_last_are_mutually_exclusive() {
        assert!(
            Cli::try_parse_from([
                "linky", "fetch", "--from", "01/01/2019", "--last", "1d", "stdout",
            ])
            .is_err()
        );
    }

    #[test]
    fn sync_defaults_cover_state_and_retention() {
        let cli = Cli::try_parse_from(["linky", "sync", "stdout"]).unwrap();
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.state, PathBuf::from("linky-state.json"));
        assert_eq!(args.retention, DateDelta::years(1));
        assert_eq!(args.common.kind, Resource::SubDaily);
    }
}
