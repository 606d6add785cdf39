//! Decode a raw, offset-padded sample array into timestamped records.
//!
//! The provider reports samples as `(ordre, valeur)` pairs counted from the
//! period start, with a `decalage` field describing how many leading entries
//! of an incomplete graph are placeholders. Ranks are 1-based and not
//! guaranteed contiguous; the transformer rebases them onto the bucket grid
//! so the first real sample of a complete window lands exactly on the period
//! start.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, trace};

use crate::domain::{RawSeries, Record, Resource, TimesheetRule};
use crate::error::Error;
use crate::series::tariff;
use crate::time::DateDelta;

const PERIOD_FORMAT: &str = "%d/%m/%Y";

/// Nominal bucket step for a resource kind.
///
/// Monthly and yearly buckets are calendar units, so they are expressed as
/// `DateDelta`, not fixed-length durations.
pub fn bucket_step(resource: Resource) -> DateDelta {
    match resource {
        Resource::SubDaily => DateDelta::minutes(30),
        Resource::Monthly => DateDelta::months(1),
        Resource::Yearly => DateDelta::years(1),
    }
}

/// Decode `raw` into records ordered by ascending timestamp.
///
/// When `bounds` is given, only records whose bucket start falls inside
/// `[bounds.0, bounds.1)` are kept. Sub-daily records are tagged with their
/// tariff period via `timesheets`.
///
/// Fails as a whole on malformed period dates; no partial output is
/// returned.
pub fn transform(
    resource: Resource,
    raw: &RawSeries,
    bounds: Option<(NaiveDateTime, NaiveDateTime)>,
    timesheets: &[TimesheetRule],
) -> Result<Vec<Record>, Error> {
    let mut start = parse_period_date(&raw.periode.date_debut)?.and_time(NaiveTime::MIN);
    let end = parse_period_date(&raw.periode.date_fin)?.and_time(NaiveTime::MIN);

    // Bucket boundaries align to calendar units, not to the provider's raw
    // reported dates.
    match resource {
        Resource::SubDaily => {}
        Resource::Monthly => {
            start = first_of_month(start);
        }
        Resource::Yearly => {
            start = first_of_year(start);
            let aligned_end = first_of_year(end);
            debug!(start = %start, end = %aligned_end, "aligned yearly period to calendar years");
        }
    }

    let step = bucket_step(resource);
    let shift = if raw.decalage > 0 {
        raw.decalage as i64 - 1
    } else {
        0
    };

    let mut samples: Vec<_> = raw.data.iter().collect();
    samples.sort_by_key(|s| s.ordre);

    let mut records = Vec::with_capacity(samples.len());
    for sample in samples {
        // Ranks are 1-based; anything at or below the shift is padding.
        let effective = sample.ordre - shift - 1;
        if effective < 0 {
            continue;
        }
        let rank = i32::try_from(effective)
            .map_err(|_| Error::Parse(format!("sample rank {} out of range", sample.ordre)))?;

        let bucket_start = (step * rank)
            .checked_add_to(start)
            .ok_or_else(|| Error::Parse(format!("bucket {rank} has no valid timestamp")))?;
        let bucket_end = (step * (rank + 1))
            .checked_add_to(start)
            .ok_or_else(|| Error::Parse(format!("bucket {rank} has no valid end timestamp")))?;

        if let Some((lo, hi)) = bounds {
            if bucket_start < lo || bucket_start >= hi {
                continue;
            }
        }

        // Negative values are provider sentinels (-2 "no value", -1
        // undocumented); both are dropped, not reported.
        if sample.valeur < 0.0 {
            trace!(ordre = sample.ordre, value = sample.valeur, "dropping sentinel sample");
            continue;
        }

        let tariff = (resource == Resource::SubDaily)
            .then(|| tariff::classify(bucket_start.time(), timesheets));

        records.push(Record {
            timestamp: bucket_start,
            duration_secs: (bucket_end - bucket_start).num_seconds(),
            value: sample.valeur,
            tariff,
        });
    }

    Ok(records)
}

fn parse_period_date(s: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(s, PERIOD_FORMAT)
        .map_err(|e| Error::Parse(format!("invalid period date '{s}': {e}")))
}

fn first_of_month(t: NaiveDateTime) -> NaiveDateTime {
    use chrono::Datelike;
    NaiveDate::from_ymd_opt(t.year(), t.month(), 1)
        .expect("first of month always exists")
        .and_time(NaiveTime::MIN)
}

fn first_of_year(t: NaiveDateTime) -> NaiveDateTime {
    use chrono::Datelike;
    NaiveDate::from_ymd_opt(t.year(), 1, 1)
        .expect("first of year always exists")
        .and_time(NaiveTime::MIN)
}
