//! Time helpers - date parsing and summary window math
//!
//! Date-to-timestamp conversion happens at the handler/service layer;
//! repositories only see `i64` Unix millis and `YYYY-MM-DD` strings.

use chrono::{Days, NaiveDate};

use super::{AppError, AppResult};

/// Milliseconds in one hour
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// Parse a date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Validate that a date is not in the future (UTC)
pub fn validate_not_future(date: NaiveDate) -> AppResult<()> {
    let today = shared::util::today_utc();
    if date > today {
        return Err(AppError::validation(format!(
            "Date {} is in the future (today is {})",
            date, today
        )));
    }
    Ok(())
}

/// Date at 00:00:00 UTC -> Unix millis
pub fn day_start_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp_millis()
}

/// Next day at 00:00:00 UTC -> Unix millis (callers use `< end` semantics)
pub fn day_end_millis(date: NaiveDate) -> i64 {
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    day_start_millis(next)
}

/// Date `days` days before the given one, formatted YYYY-MM-DD
pub fn days_before(date: NaiveDate, days: u64) -> String {
    date.checked_sub_days(Days::new(days))
        .unwrap_or(date)
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_valid() {
        let d = parse_date("2025-03-01").unwrap();
        assert_eq!(d.format("%Y-%m-%d").to_string(), "2025-03-01");
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("03/01/2025").is_err());
        assert!(parse_date("not-a-date").is_err());
    }

    #[test]
    fn test_day_bounds() {
        let d = parse_date("2025-03-01").unwrap();
        let start = day_start_millis(d);
        let end = day_end_millis(d);
        assert_eq!(end - start, 24 * HOUR_MS);
    }

    #[test]
    fn test_days_before() {
        let d = parse_date("2025-03-08").unwrap();
        assert_eq!(days_before(d, 7), "2025-03-01");
    }
}
