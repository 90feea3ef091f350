use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Utc};

use crate::error::PayrollError;
use crate::model::period::{MAX_PERIOD_DAYS, PayPeriod};

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Resolve the pay period for a submission.
///
/// - both dates: validated as given, at most [`MAX_PERIOD_DAYS`] long
/// - one date: the other end is placed so the period covers a full week
/// - neither: the Monday..Sunday week containing `today`
///
/// Blank strings count as absent.
pub fn resolve_period(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<PayPeriod, PayrollError> {
    let start = non_blank(start).map(parse_date).transpose()?;
    let end = non_blank(end).map(parse_date).transpose()?;
    let span = Days::new((MAX_PERIOD_DAYS - 1) as u64);

    match (start, end) {
        (Some(start), Some(end)) => PayPeriod::new(start, end),
        (Some(start), None) => {
            let end = start
                .checked_add_days(span)
                .ok_or_else(|| PayrollError::InvalidPeriod(format!("{start} is out of range")))?;
            PayPeriod::new(start, end)
        }
        (None, Some(end)) => {
            let start = end
                .checked_sub_days(span)
                .ok_or_else(|| PayrollError::InvalidPeriod(format!("{end} is out of range")))?;
            PayPeriod::new(start, end)
        }
        (None, None) => Ok(current_week(today)),
    }
}

/// ISO week (Monday first) containing `day`.
pub fn current_week(day: NaiveDate) -> PayPeriod {
    let from_monday = u64::from(day.weekday().num_days_from_monday());
    let monday = day - Days::new(from_monday);
    let sunday = monday + Days::new(6);
    PayPeriod {
        week_start: monday,
        week_end: sunday,
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (normalized to their UTC date) and
/// naive `YYYY-MM-DDTHH:MM:SS` timestamps (taken as UTC).
pub fn parse_date(raw: &str) -> Result<NaiveDate, PayrollError> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts.date());
    }

    Err(PayrollError::InvalidPeriod(format!(
        "'{raw}' is not a date (expected YYYY-MM-DD)"
    )))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn defaults_to_monday_through_sunday() {
        // 2025-09-03 is a Wednesday
        let p = resolve_period(None, None, date("2025-09-03")).unwrap();
        assert_eq!(p.week_start, date("2025-09-01"));
        assert_eq!(p.week_end, date("2025-09-07"));

        // Monday and Sunday map onto their own week
        assert_eq!(current_week(date("2025-09-01")), p);
        assert_eq!(current_week(date("2025-09-07")), p);
    }

    #[test]
    fn explicit_dates_are_kept() {
        let p = resolve_period(Some("2025-09-02"), Some("2025-09-06"), date("2030-01-01")).unwrap();
        assert_eq!(p.key(), "2025-09-02_2025-09-06");

        let single_day = resolve_period(Some("2025-09-02"), Some("2025-09-02"), date("2030-01-01"));
        assert_eq!(single_day.unwrap().length_days(), 1);
    }

    #[test]
    fn timestamps_are_stripped_to_utc_dates() {
        let p = resolve_period(
            Some("2025-09-01T23:30:00-02:00"),
            Some("2025-09-07T10:00:00Z"),
            date("2030-01-01"),
        )
        .unwrap();
        // 23:30 at UTC-2 is already the 2nd in UTC
        assert_eq!(p.week_start, date("2025-09-02"));
        assert_eq!(p.week_end, date("2025-09-07"));

        assert_eq!(parse_date("2025-09-01T08:15:00").unwrap(), date("2025-09-01"));
    }

    #[test]
    fn single_bound_fills_a_week() {
        let p = resolve_period(Some("2025-09-01"), None, date("2030-01-01")).unwrap();
        assert_eq!(p.key(), "2025-09-01_2025-09-07");

        let p = resolve_period(Some(" "), Some("2025-09-07"), date("2030-01-01")).unwrap();
        assert_eq!(p.key(), "2025-09-01_2025-09-07");
    }

    #[test]
    fn rejects_inverted_long_and_malformed_periods() {
        let today = date("2030-01-01");
        for (start, end) in [
            ("2025-09-07", "2025-09-01"),
            ("2025-09-01", "2025-09-08"),
            ("yesterday", "2025-09-07"),
            ("2025-02-30", "2025-03-02"),
        ] {
            assert!(
                matches!(
                    resolve_period(Some(start), Some(end), today),
                    Err(PayrollError::InvalidPeriod(_))
                ),
                "{start}..{end} should be rejected"
            );
        }
    }
}
