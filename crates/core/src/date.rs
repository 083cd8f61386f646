use chrono::{DateTime, Local, NaiveDate};

use crate::error::ParseError;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parses the date forms statement pages produce.
///
/// Accepts `YYYY-MM-DD` and `YYYY/MM/DD` (month and day may be unpadded),
/// and RFC 3339 timestamps, which are converted to the local calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ParseError> {
    let s = s.trim();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Local).date_naive());
    }

    Err(ParseError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn iso_date() {
        assert_eq!(parse_date("2024-01-05").unwrap(), ymd(2024, 1, 5));
    }

    #[test]
    fn unpadded_month_and_day() {
        assert_eq!(parse_date("2024-1-5").unwrap(), ymd(2024, 1, 5));
    }

    #[test]
    fn slash_separated() {
        assert_eq!(parse_date("2023/12/31").unwrap(), ymd(2023, 12, 31));
    }

    #[test]
    fn rfc3339_uses_local_calendar_date() {
        let parsed = parse_date("2024-06-15T12:00:00+00:00").unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-06-15T12:00:00+00:00")
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(parse_date("not-a-date"), Err(ParseError::InvalidDate(_))));
        assert!(parse_date("2024-13-01").is_err());
    }
}
