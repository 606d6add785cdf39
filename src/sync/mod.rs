//! Watermark-based incremental fetch planning.
//!
//! Repeated runs must neither duplicate nor skip data: each committed window
//! starts exactly where the previous one ended, and the watermark only moves
//! once a window has been validated for emission. A misaligned or truncated
//! response is discarded wholesale and retried on the next cycle.

pub mod state;

pub use state::{SyncState, Watermark};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::warn;

use crate::domain::{Record, Resource};
use crate::time::DateDelta;

/// A planned `[start, end)` query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Compute the next query window for a resource kind.
///
/// The window always ends at last midnight of `today` (the civil date in the
/// reference timezone). With a watermark, the window starts the day after
/// it; without one, `retention` bounds the lookback to what the provider
/// still retains. Returns `None` when there is nothing to fetch.
pub fn plan_window(watermark: Watermark, today: NaiveDate, retention: DateDelta) -> Option<Window> {
    let end = today.and_time(NaiveTime::MIN);
    let start = match watermark.last {
        Some(last) => (last + Duration::days(1)).and_time(NaiveTime::MIN),
        None => match retention.checked_sub_from(end) {
            Some(t) => t,
            None => {
                warn!(%end, "retention lookback from this date is not a valid civil date");
                return None;
            }
        },
    };
    if start >= end {
        return None;
    }
    Some(Window { start, end })
}

/// First bucket boundary at or after `t` on the resource's grid.
///
/// Sub-daily windows start at midnight, which lies on the 30-minute grid, so
/// the expected first bucket is the window start itself. Monthly and yearly
/// buckets are pinned to calendar-unit boundaries.
pub fn expected_first(resource: Resource, t: NaiveDateTime) -> NaiveDateTime {
    let midnight = t.time() == NaiveTime::MIN;
    match resource {
        Resource::SubDaily => t,
        Resource::Monthly => {
            if t.day() == 1 && midnight {
                t
            } else {
                let (year, month) = if t.month() == 12 {
                    (t.year() + 1, 1)
                } else {
                    (t.year(), t.month() + 1)
                };
                first_day(year, month)
            }
        }
        Resource::Yearly => {
            if t.ordinal() == 1 && midnight {
                t
            } else {
                first_day(t.year() + 1, 1)
            }
        }
    }
}

fn first_day(year: i32, month: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, 1)
        .expect("first of month always exists")
        .and_time(NaiveTime::MIN)
}

/// Decide whether a fetched window may be committed.
///
/// Returns the new watermark date when the response lines up with the
/// requested window. `None` means nothing is durable: the caller must not
/// emit the records, and the same window will be planned again next cycle.
pub fn commit(resource: Resource, window: &Window, records: &[Record]) -> Option<NaiveDate> {
    let Some(first) = records.first() else {
        warn!(
            resource = resource.label(),
            start = %window.start,
            "empty response, watermark left untouched"
        );
        return None;
    };

    let expected = expected_first(resource, window.start);
    if first.timestamp != expected {
        warn!(
            resource = resource.label(),
            expected = %expected,
            got = %first.timestamp,
            "misaligned response, discarding window"
        );
        return None;
    }

    records.last().map(|r| r.timestamp.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
        date(year, month, day).and_time(NaiveTime::MIN)
    }

    fn record(timestamp: NaiveDateTime) -> Record {
        Record {
            timestamp,
            duration_secs: 1800,
            value: 1.0,
            tariff: None,
        }
    }

    #[test]
    fn first_run_looks_back_over_the_retention() {
        let window = plan_window(Watermark::default(), date(2020, 3, 1), DateDelta::years(1)).unwrap();
        assert_eq!(window.start, midnight(2019, 3, 1));
        assert_eq!(window.end, midnight(2020, 3, 1));
    }

    #[test]
    fn window_starts_right_after_the_watermark() {
        let watermark = Watermark {
            last: Some(date(2020, 2, 10)),
        };
        let window = plan_window(watermark, date(2020, 3, 1), DateDelta::years(1)).unwrap();
        assert_eq!(window.start, midnight(2020, 2, 11));
        assert_eq!(window.end, midnight(2020, 3, 1));
    }

    #[test]
    fn caught_up_watermark_means_nothing_to_do() {
        let watermark = Watermark {
            last: Some(date(2020, 2, 29)),
        };
        assert_eq!(
            plan_window(watermark, date(2020, 3, 1), DateDelta::years(1)),
            None
        );
    }

    #[test]
    fn aligned_window_advances_to_the_last_record() {
        let window = Window {
            start: midnight(2020, 2, 11),
            end: midnight(2020, 2, 13),
        };
        let records = vec![
            record(midnight(2020, 2, 11)),
            record(midnight(2020, 2, 11) + Duration::minutes(30)),
            record(midnight(2020, 2, 12) + Duration::minutes(1410)),
        ];
        assert_eq!(
            commit(Resource::SubDaily, &window, &records),
            Some(date(2020, 2, 12))
        );
    }

    #[test]
    fn misaligned_first_record_refuses_the_window() {
        let window = Window {
            start: midnight(2020, 2, 11),
            end: midnight(2020, 2, 13),
        };
        let records = vec![record(midnight(2020, 2, 11) + Duration::minutes(30))];
        assert_eq!(commit(Resource::SubDaily, &window, &records), None);
    }

    #[test]
    fn empty_response_refuses_the_window() {
        let window = Window {
            start: midnight(2020, 2, 11),
            end: midnight(2020, 2, 13),
        };
        assert_eq!(commit(Resource::SubDaily, &window, &[]), None);
    }

    #[test]
    fn calendar_resources_expect_the_next_bucket_boundary() {
        assert_eq!(
            expected_first(Resource::Monthly, midnight(2020, 2, 2)),
            midnight(2020, 3, 1)
        );
        assert_eq!(
            expected_first(Resource::Monthly, midnight(2020, 12, 2)),
            midnight(2021, 1, 1)
        );
        assert_eq!(
            expected_first(Resource::Monthly, midnight(2020, 3, 1)),
            midnight(2020, 3, 1)
        );
        assert_eq!(
            expected_first(Resource::Yearly, midnight(2020, 6, 15)),
            midnight(2021, 1, 1)
        );
        assert_eq!(
            expected_first(Resource::SubDaily, midnight(2020, 2, 2)),
            midnight(2020, 2, 2)
        );
    }
}
