use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::error::ApiError;

/// `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation("Invalid date format. Use YYYY-MM-DD"))
}

/// Strict two-digit `HH:MM`, 00:00 through 23:59
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    if !bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 2 || b.is_ascii_digit())
    {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Both times present, well-formed and start before end
pub fn validate_time_range(start: Option<&str>, end: Option<&str>) -> Result<(), ApiError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Err(ApiError::validation(
            "Start time and end time are required for custom hours",
        ));
    };

    let (Some(start), Some(end)) = (parse_hhmm(start), parse_hhmm(end)) else {
        return Err(ApiError::validation("Times must be in HH:MM format"));
    };

    if start >= end {
        return Err(ApiError::validation("Start time must be before end time"));
    }

    Ok(())
}

pub fn parse_uuid(value: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::validation(format!("Invalid {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hhmm_is_strict() {
        assert!(parse_hhmm("09:30").is_some());
        assert!(parse_hhmm("23:59").is_some());
        assert!(parse_hhmm("9:30").is_none());
        assert!(parse_hhmm("24:00").is_none());
        assert!(parse_hhmm("09:60").is_none());
        assert!(parse_hhmm("0930").is_none());
    }

    #[test]
    fn time_range_requires_order() {
        assert!(validate_time_range(Some("09:00"), Some("12:00")).is_ok());
        assert!(validate_time_range(Some("12:00"), Some("09:00")).is_err());
        assert!(validate_time_range(Some("09:00"), None).is_err());
    }

    #[test]
    fn dates_parse_iso_only() {
        assert!(parse_date("2030-01-07").is_ok());
        assert!(parse_date("01/07/2030").is_err());
        assert!(parse_date("2030-02-30").is_err());
    }
}
