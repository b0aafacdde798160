//! Calendar-day conversions for callers that accept `YYYY-MM-DD` input.
//! Evaluation itself only ever sees instants.

use anyhow::{Context, Result};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const DAY: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse `YYYY-MM-DD` into midnight UTC of that day.
pub fn parse_day(s: &str) -> Result<OffsetDateTime> {
    let date = Date::parse(s.trim(), DAY).with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD"))?;
    Ok(date.midnight().assume_utc())
}

pub fn format_day(at: OffsetDateTime) -> String {
    at.date().format(DAY).unwrap_or_else(|_| at.date().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_midnight_utc() {
        assert_eq!(parse_day("2011-12-18").unwrap(), datetime!(2011-12-18 0:00 UTC));
        assert_eq!(format_day(datetime!(2000-01-01 23:59 UTC)), "2000-01-01");
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_day("18.12.2011").is_err());
        assert!(parse_day("2011-13-01").is_err());
        assert!(parse_day("").is_err());
    }
}
