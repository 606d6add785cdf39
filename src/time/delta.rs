//! A signed duration made of whole calendar months plus a sub-day remainder.
//!
//! Calendar months and years have variable length, so "one month from here"
//! cannot be expressed as a `chrono::Duration`. `DateDelta` keeps the month
//! count symbolic and applies it with calendar rollover when added to a
//! timestamp. The application order matters and is fixed: the sub-day part
//! first (ordinary fixed-length arithmetic), then the month part.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// A calendar duration: `months` whole months plus a fixed-length `delta`.
///
/// Years are folded into months at construction; no separate year count
/// persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateDelta {
    months: i32,
    delta: Duration,
}

impl DateDelta {
    pub fn months(months: i32) -> Self {
        Self {
            months,
            delta: Duration::zero(),
        }
    }

    pub fn years(years: i32) -> Self {
        Self::months(years * 12)
    }

    pub fn days(days: i64) -> Self {
        Self {
            months: 0,
            delta: Duration::days(days),
        }
    }

    pub fn minutes(minutes: i64) -> Self {
        Self {
            months: 0,
            delta: Duration::minutes(minutes),
        }
    }

    pub fn month_count(&self) -> i32 {
        self.months
    }

    /// Add this delta to a timestamp.
    ///
    /// The sub-day component is applied first; the month count is then
    /// applied over `(year, month)` with rollover, preserving day-of-month
    /// and time-of-day. The result is `None` when the preserved day does not
    /// exist in the target month (e.g. Jan 31 + 1 month) or when the fixed
    /// part overflows the representable range.
    pub fn checked_add_to(&self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        let t = t.checked_add_signed(self.delta)?;
        if self.months == 0 {
            return Some(t);
        }

        let (year, month) = if self.months > 0 {
            let mut year = t.year() + self.months / 12;
            let sum = self.months % 12 + t.month() as i32;
            if sum > 12 {
                year += 1;
                (year, (sum - 12) as u32)
            } else {
                (year, sum as u32)
            }
        } else {
            let m = -self.months;
            let mut year = t.year() - m / 12;
            let rem = m % 12;
            let month = t.month() as i32 - rem;
            if month < 1 {
                year -= 1;
                (year, (12 - (rem - t.month() as i32)) as u32)
            } else {
                (year, month as u32)
            }
        };

        let date = NaiveDate::from_ymd_opt(year, month, t.day())?;
        Some(date.and_time(t.time()))
    }

    /// Subtract this delta from a timestamp (negate, then add).
    pub fn checked_sub_from(&self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        (-*self).checked_add_to(t)
    }
}

impl From<Duration> for DateDelta {
    fn from(delta: Duration) -> Self {
        Self { months: 0, delta }
    }
}

impl Add for DateDelta {
    type Output = DateDelta;

    fn add(self, rhs: DateDelta) -> DateDelta {
        DateDelta {
            months: self.months + rhs.months,
            delta: self.delta + rhs.delta,
        }
    }
}

impl Add<Duration> for DateDelta {
    type Output = DateDelta;

    fn add(self, rhs: Duration) -> DateDelta {
        self + DateDelta::from(rhs)
    }
}

impl Sub for DateDelta {
    type Output = DateDelta;

    fn sub(self, rhs: DateDelta) -> DateDelta {
        self + (-rhs)
    }
}

impl Neg for DateDelta {
    type Output = DateDelta;

    fn neg(self) -> DateDelta {
        DateDelta {
            months: -self.months,
            delta: -self.delta,
        }
    }
}

impl Mul<i32> for DateDelta {
    type Output = DateDelta;

    fn mul(self, rhs: i32) -> DateDelta {
        DateDelta {
            months: self.months * rhs,
            delta: self.delta * rhs,
        }
    }
}

impl fmt::Display for DateDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.delta.num_days();
        let rem = self.delta - Duration::days(days);
        let secs = rem.num_seconds();
        let (hh, rest) = (secs / 3600, secs % 3600);
        let (mm, ss) = (rest / 60, rest % 60);

        if self.months != 0 {
            write!(
                f,
                "{} month{}, ",
                self.months,
                if self.months.abs() != 1 { "s" } else { "" }
            )?;
        }
        if days != 0 {
            write!(f, "{} day{}, ", days, if days.abs() != 1 { "s" } else { "" })?;
        }
        write!(f, "{hh}:{mm:02}:{ss:02}")
    }
}
