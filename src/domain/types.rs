//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - decoded straight from the provider payload at the boundary
//! - used in-memory during transformation
//! - exported to the sinks without further mapping

use chrono::{NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which consumption curve to query.
///
/// Each kind maps to a provider-side resource id on the consumption portlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    /// 30-minute load curve.
    SubDaily,
    /// One sample per calendar month.
    Monthly,
    /// One sample per calendar year.
    Yearly,
}

impl Resource {
    /// Provider resource id for the consumption portlet.
    pub fn provider_id(self) -> &'static str {
        match self {
            Resource::SubDaily => "urlCdcHeure",
            Resource::Monthly => "urlCdcMois",
            Resource::Yearly => "urlCdcAn",
        }
    }

    /// Stable label used for state-file keys, measurement names and logs.
    pub fn label(self) -> &'static str {
        match self {
            Resource::SubDaily => "sub-daily",
            Resource::Monthly => "monthly",
            Resource::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Tariff period of a sub-daily sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tariff {
    Peak,
    OffPeak,
    Normal,
}

impl Tariff {
    pub fn label(self) -> &'static str {
        match self {
            Tariff::Peak => "peak",
            Tariff::OffPeak => "offpeak",
            Tariff::Normal => "normal",
        }
    }
}

/// A time-of-day interval during which consumption is billed off-peak.
///
/// `start > end` represents an interval wrapping past midnight
/// (e.g. 22:00-06:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimesheetRule {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimesheetRule {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse a `"HH:MM-HH:MM"` rule.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let (start, end) = s.split_once('-').ok_or_else(|| {
            Error::Parse(format!("invalid timesheet '{s}': expected HH:MM-HH:MM"))
        })?;
        Self::from_parts(start, end)
    }

    /// Build a rule from two `"HH:MM"` strings.
    pub fn from_parts(start: &str, end: &str) -> Result<Self, Error> {
        Ok(Self::new(parse_time(start)?, parse_time(end)?))
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| Error::Parse(format!("invalid time '{s}': {e}")))
}

/// One point of the provider's raw sample array.
///
/// `ordre` values are not guaranteed contiguous or zero-based; negative
/// `valeur` entries are provider sentinels, not measurements.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSample {
    pub ordre: i64,
    pub valeur: f64,
}

/// The provider's raw consumption graph for one queried window.
///
/// Period dates stay as provider-formatted strings (`DD/MM/YYYY`) until the
/// transformer validates them; `decalage` counts leading placeholder entries
/// of an incomplete graph.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSeries {
    pub decalage: u32,
    pub periode: RawPeriod,
    pub data: Vec<RawSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPeriod {
    #[serde(rename = "dateDebut")]
    pub date_debut: String,
    #[serde(rename = "dateFin")]
    pub date_fin: String,
}

/// A normalized, timestamped consumption record.
///
/// Immutable once produced by the transformer; values are in the provider's
/// unit (kW), any scaling is a sink concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub duration_secs: i64,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tariff: Option<Tariff>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timesheet_parses_wall_clock_pairs() {
        let rule = TimesheetRule::parse("22:00-06:00").unwrap();
        assert_eq!(rule.start, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        assert_eq!(rule.end, NaiveTime::from_hms_opt(6, 0, 0).unwrap());

        assert!(TimesheetRule::parse("22h00-06:00").is_err());
        assert!(TimesheetRule::parse("22:00").is_err());
    }
}
