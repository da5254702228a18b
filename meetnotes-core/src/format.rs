//! Display helpers for meeting times.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

/// Formats a wall-clock time as `10:00 AM`.
pub fn format_time<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%-I:%M %p").to_string()
}

/// Formats a meeting date as `Monday, January 1`.
pub fn format_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%A, %B %-d").to_string()
}

/// Formats a start/end pair as `10:00 AM - 11:00 AM` in the given zone.
pub fn format_time_range<Tz: TimeZone>(
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} - {}",
        format_time(&start.with_timezone(tz)),
        format_time(&end.with_timezone(tz))
    )
}

/// Meeting length in whole minutes, rounded half up.
pub fn duration_minutes(start: &DateTime<Utc>, end: &DateTime<Utc>) -> i64 {
    let millis = (*end - *start).num_milliseconds() as f64;
    (millis / 60_000.0 + 0.5).floor() as i64
}

/// True when `dt`, seen in its own zone, falls on `date`.
pub fn is_same_day<Tz: TimeZone>(dt: &DateTime<Tz>, date: NaiveDate) -> bool {
    dt.year() == date.year() && dt.month() == date.month() && dt.day() == date.day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(&utc(2024, 1, 1, 10, 0, 0)), "10:00 AM");
        assert_eq!(format_time(&utc(2024, 1, 1, 15, 5, 0)), "3:05 PM");
        assert_eq!(format_time(&utc(2024, 1, 1, 0, 30, 0)), "12:30 AM");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(&utc(2024, 1, 1, 10, 0, 0)), "Monday, January 1");
    }

    #[test]
    fn test_format_time_range_uses_zone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let range = format_time_range(&utc(2024, 1, 1, 10, 0, 0), &utc(2024, 1, 1, 11, 0, 0), &tz);
        assert_eq!(range, "12:00 PM - 1:00 PM");
    }

    #[test]
    fn test_duration_minutes_rounds() {
        let start = utc(2024, 1, 1, 10, 0, 0);
        assert_eq!(duration_minutes(&start, &utc(2024, 1, 1, 10, 45, 0)), 45);
        assert_eq!(duration_minutes(&start, &utc(2024, 1, 1, 10, 0, 29)), 0);
        assert_eq!(duration_minutes(&start, &utc(2024, 1, 1, 10, 0, 30)), 1);
        assert_eq!(duration_minutes(&start, &start), 0);
    }

    #[test]
    fn test_is_same_day_compares_local_calendar_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(is_same_day(&utc(2024, 1, 1, 23, 0, 0), date));

        // 23:00 UTC is already the next day at UTC+2
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        assert!(!is_same_day(&utc(2024, 1, 1, 23, 0, 0).with_timezone(&tz), date));
    }
}
