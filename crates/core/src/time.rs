//! Clock helpers.
//!
//! Every timestamp written to the store goes through [`truncate`]: whole
//! seconds in UTC keep the textual form fixed-width, so SQL comparisons on
//! the stored text follow chronological order.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// Current time, truncated to whole seconds
pub fn now() -> DateTime<Utc> {
    truncate(Utc::now())
}

pub fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(0)
}

/// "May 15, 2024 03:30 PM"
pub fn format_long(ts: DateTime<Utc>) -> String {
    ts.format("%B %d, %Y %I:%M %p").to_string()
}

/// Parse an HTML `datetime-local` value ("2024-05-15T15:30", seconds
/// optional, a space separator is also accepted) as UTC.
pub fn parse_form_datetime(raw: &str) -> CoreResult<DateTime<Utc>> {
    let raw = raw.trim();
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| truncate(naive.and_utc()))
        .ok_or_else(|| CoreError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_now_has_no_subsecs() {
        assert_eq!(now().nanosecond(), 0);
    }

    #[test]
    fn test_format_long() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 15, 15, 30, 0).unwrap();
        assert_eq!(format_long(ts), "May 15, 2024 03:30 PM");
    }

    #[test]
    fn test_parse_form_datetime() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 15, 15, 30, 0).unwrap();
        assert_eq!(parse_form_datetime("2024-05-15T15:30").unwrap(), expected);
        assert_eq!(parse_form_datetime("2024-05-15 15:30:00").unwrap(), expected);
        assert!(matches!(
            parse_form_datetime("tomorrow"),
            Err(CoreError::InvalidDate(_))
        ));
    }
}
