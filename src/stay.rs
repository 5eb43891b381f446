// Stay periods and the overtime policy

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::billing::BillingError;

/// Check-in and check-out calendar dates of one stay. Time of day is not part of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStayPeriod")]
pub struct StayPeriod {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

#[derive(Deserialize)]
struct RawStayPeriod {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl TryFrom<RawStayPeriod> for StayPeriod {
    type Error = BillingError;

    fn try_from(raw: RawStayPeriod) -> Result<Self, Self::Error> {
        StayPeriod::new(raw.check_in, raw.check_out)
    }
}

impl StayPeriod {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, BillingError> {
        if check_out < check_in {
            return Err(BillingError::InvalidStayPeriod {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    // Whole calendar days between the two dates
    pub fn days_between(&self) -> u32 {
        (self.check_out - self.check_in).num_days().max(0) as u32
    }

    // Billable nights; a same-day stay is still one night
    pub fn nights(&self) -> u32 {
        self.days_between().max(1)
    }

    // True when the given date falls inside the stay, check-out day included
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.check_in && date <= self.check_out
    }

    // Inclusive overlap with the range [from, to]; either bound may be open
    pub fn overlaps(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
        from.map_or(true, |from| self.check_out >= from) && to.map_or(true, |to| self.check_in <= to)
    }
}

// Checkout time used when the configuration does not say otherwise
pub fn default_checkout_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

// Overtime is a label only: paying after the scheduled checkout instant sets the flag,
// but the bill changes only when staff add extra nights explicitly.
pub fn is_overtime(check_out: NaiveDate, paid_at: NaiveDateTime, checkout_time: NaiveTime) -> bool {
    paid_at > check_out.and_time(checkout_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test_case("2024-01-01", "2024-01-03", 2; "#1 two nights")]
    #[test_case("2024-01-01", "2024-01-01", 1; "#2 same day is one night")]
    #[test_case("2024-01-31", "2024-02-01", 1; "#3 across month end")]
    #[test_case("2024-02-28", "2024-03-01", 2; "#4 leap day")]
    #[test_case("2023-12-30", "2024-01-06", 7; "#5 across year end")]
    fn test_nights(check_in: &str, check_out: &str, expected: u32) {
        let stay = StayPeriod::new(date(check_in), date(check_out)).unwrap();
        assert_eq!(stay.nights(), expected);
    }

    #[test]
    fn test_checkout_before_checkin_is_rejected() {
        let result = StayPeriod::new(date("2024-01-03"), date("2024-01-01"));
        assert!(matches!(
            result,
            Err(BillingError::InvalidStayPeriod { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates_order() {
        let ok: Result<StayPeriod, _> =
            serde_json::from_str(r#"{"check_in":"2024-01-01","check_out":"2024-01-03"}"#);
        assert_eq!(ok.unwrap().nights(), 2);

        let bad: Result<StayPeriod, _> =
            serde_json::from_str(r#"{"check_in":"2024-01-05","check_out":"2024-01-03"}"#);
        assert!(bad.is_err());
    }

    #[test_case("2024-01-03 11:59", false; "#1 before checkout time")]
    #[test_case("2024-01-03 12:00", false; "#2 exactly at checkout time")]
    #[test_case("2024-01-03 12:01", true; "#3 after checkout time")]
    #[test_case("2024-01-04 08:00", true; "#4 next day")]
    #[test_case("2024-01-02 18:00", false; "#5 early departure")]
    fn test_overtime(paid_at: &str, expected: bool) {
        assert_eq!(
            is_overtime(date("2024-01-03"), at(paid_at), default_checkout_time()),
            expected
        );
    }

    #[test]
    fn test_overlaps_open_bounds() {
        let stay = StayPeriod::new(date("2024-01-10"), date("2024-01-15")).unwrap();
        assert!(stay.overlaps(None, None));
        assert!(stay.overlaps(Some(date("2024-01-15")), None));
        assert!(!stay.overlaps(Some(date("2024-01-16")), None));
        assert!(stay.overlaps(None, Some(date("2024-01-10"))));
        assert!(!stay.overlaps(None, Some(date("2024-01-09"))));
        assert!(stay.contains(date("2024-01-12")));
    }
}
