//! Shared fetch → transform → export pipeline for both run modes.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! login -> raw fetch -> transform/classify -> (plan/commit) -> sink
//!
//! The CLI layer focuses on argument shapes; this module owns sequencing
//! and the rule that nothing is persisted unless the planner commits.

use chrono::{Duration, Local, NaiveTime};
use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::cli::{FetchArgs, SyncArgs};
use crate::config::Config;
use crate::data::{self, EnedisClient};
use crate::domain::Resource;
use crate::error::Error;
use crate::series::transform;
use crate::sync::{self, SyncState};
use crate::time::DateDelta;

/// One-shot fetch over an explicit range, straight to the sink.
pub fn run_fetch(args: &FetchArgs) -> Result<(), Error> {
    let config = super::assemble_config(&args.common)?;
    let mut sink = super::build_sink(&args.sink, &config)?;
    let kind = args.common.kind;

    let to = args.to.unwrap_or_else(|| Local::now().date_naive());
    let from = match args.from {
        Some(date) => date,
        None => {
            let lookback = args.last.unwrap_or_else(|| default_lookback(kind));
            lookback
                .checked_sub_from(to.and_time(NaiveTime::MIN))
                .ok_or_else(|| {
                    Error::Parse(format!("lookback {lookback} from {to} is not a valid date"))
                })?
                .date()
        }
    };

    let client = connect(&config)?;
    let enedis = EnedisClient::new(&client, data::DATA_URL);
    let raw = enedis.fetch_raw(kind, from, to)?;

    // `--to` is an inclusive civil date, so the filter runs to next midnight.
    let bounds = (
        from.and_time(NaiveTime::MIN),
        (to + Duration::days(1)).and_time(NaiveTime::MIN),
    );
    let records = transform(kind, &raw, Some(bounds), &config.enedis.timesheets)?;
    info!(resource = kind.label(), count = records.len(), "transformed records");

    let written = sink.save(kind, &records)?;
    info!(written, "export complete");
    Ok(())
}

/// Incremental run: plan from the watermark, commit all-or-nothing.
pub fn run_sync(args: &SyncArgs) -> Result<(), Error> {
    let config = super::assemble_config(&args.common)?;
    let mut sink = super::build_sink(&args.sink, &config)?;
    let kind = args.common.kind;

    let mut state = SyncState::load(&args.state)?;
    let today = Local::now().date_naive();
    let Some(window) = sync::plan_window(state.watermark(kind), today, args.retention) else {
        info!(resource = kind.label(), "watermark is already caught up");
        return Ok(());
    };
    info!(
        resource = kind.label(),
        start = %window.start,
        end = %window.end,
        "planned incremental window"
    );

    let client = connect(&config)?;
    let enedis = EnedisClient::new(&client, data::DATA_URL);
    let raw = enedis.fetch_raw(kind, window.start.date(), window.end.date())?;
    let records = transform(
        kind,
        &raw,
        Some((window.start, window.end)),
        &config.enedis.timesheets,
    )?;

    match sync::commit(kind, &window, &records) {
        Some(last) => {
            let written = sink.save(kind, &records)?;
            state.advance(kind, last);
            state.save(&args.state)?;
            info!(written, watermark = %last, "window committed");
        }
        None => {
            warn!(resource = kind.label(), "window not committed; will retry next run");
        }
    }
    Ok(())
}

/// Default lookback when neither `--from` nor `--last` is given.
fn default_lookback(kind: Resource) -> DateDelta {
    match kind {
        Resource::SubDaily => DateDelta::days(1),
        Resource::Monthly => DateDelta::months(1),
        Resource::Yearly => DateDelta::years(1),
    }
}

/// Authenticate against the portal and return the session-bearing client.
fn connect(config: &Config) -> Result<Client, Error> {
    let (username, password) = config.require_credentials()?;
    let client = data::build_client()?;
    data::login(&client, data::LOGIN_URL, username, password)?;
    Ok(client)
}
