use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_english::{parse_date_string, Dialect};

use crate::engine::error::TrackError;

/// Day first formats, plus ISO.
const DATE_FORMATS: [&str; 3] = ["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// This is the standard way of converting a date to a string in timetrack.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a date typed by the user. Accepts the fixed formats in [DATE_FORMATS] and relative
/// expressions such as "yesterday" or "last friday", evaluated against `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate, TrackError> {
    let input = input.trim();
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
    {
        return Ok(date);
    }

    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
    let now = Utc.from_utc_datetime(&today.and_time(noon));
    parse_date_string(input, now, Dialect::Uk)
        .map(|v| v.date_naive())
        .map_err(|_| TrackError::InvalidDate(input.to_string()))
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Short format used by timesheet spreadsheets, e.g. `9-Dec`.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%-d-%b").to_string()
}
