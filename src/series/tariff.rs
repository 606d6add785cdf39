//! Tariff-period classification for sub-daily samples.

use chrono::NaiveTime;

use crate::domain::{Tariff, TimesheetRule};

/// Classify a time of day against the configured off-peak windows.
///
/// An empty rule set means the subscription has a single tariff. Rules with
/// `start <= end` match `start <= t < end`; rules wrapping past midnight
/// match `t >= start || t < end`.
pub fn classify(t: NaiveTime, rules: &[TimesheetRule]) -> Tariff {
    if rules.is_empty() {
        return Tariff::Normal;
    }
    for rule in rules {
        let hit = if rule.start <= rule.end {
            rule.start <= t && t < rule.end
        } else {
            t >= rule.start || t < rule.end
        };
        if hit {
            return Tariff::OffPeak;
        }
    }
    Tariff::Peak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn wrapping_rule_matches_both_sides_of_midnight() {
        let rules = [TimesheetRule::new(hm(22, 0), hm(6, 0))];
        assert_eq!(classify(hm(1, 30), &rules), Tariff::OffPeak);
        assert_eq!(classify(hm(23, 30), &rules), Tariff::OffPeak);
        assert_eq!(classify(hm(7, 30), &rules), Tariff::Peak);
    }

    #[test]
    fn interval_is_closed_open() {
        let rules = [TimesheetRule::new(hm(22, 0), hm(6, 0))];
        assert_eq!(classify(hm(22, 0), &rules), Tariff::OffPeak);
        assert_eq!(classify(hm(6, 0), &rules), Tariff::Peak);

        let plain = [TimesheetRule::new(hm(12, 0), hm(14, 0))];
        assert_eq!(classify(hm(12, 0), &plain), Tariff::OffPeak);
        assert_eq!(classify(hm(14, 0), &plain), Tariff::Peak);
    }

    #[test]
    fn no_rules_means_single_tariff() {
        assert_eq!(classify(hm(3, 0), &[]), Tariff::Normal);
        assert_eq!(classify(hm(15, 0), &[]), Tariff::Normal);
    }

    #[test]
    fn any_matching_rule_wins() {
        let rules = [
            TimesheetRule::new(hm(2, 0), hm(7, 0)),
            TimesheetRule::new(hm(12, 30), hm(14, 0)),
        ];
        assert_eq!(classify(hm(13, 0), &rules), Tariff::OffPeak);
        assert_eq!(classify(hm(8, 0), &rules), Tariff::Peak);
    }
}
