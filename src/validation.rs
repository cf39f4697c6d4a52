//! Write-path validation helpers shared by every handler: required-field
//! enumeration, date/time parsing and closed-enum decoding.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};

use crate::error::ApiError;

/// A required text field is absent when missing or blank
pub fn present(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

/// Fail with one ValidationError naming every missing required field
pub fn require_fields(fields: &[(&str, bool)]) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();
    for (name, present) in fields {
        if !present {
            field_errors.insert(name.to_string(), "This field is required".to_string());
        }
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Missing required fields", Some(field_errors)))
    }
}

pub fn field_error(field: &str, message: impl Into<String>) -> ApiError {
    let mut field_errors = HashMap::new();
    field_errors.insert(field.to_string(), message.into());
    ApiError::validation_error("Invalid field value", Some(field_errors))
}

/// Decode a closed enumeration from its wire string
pub fn parse_enum<T>(field: &str, value: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = String>,
{
    T::from_str(value).map_err(|msg| field_error(field, msg))
}

/// Dates travel as "YYYY-MM-DD"
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| field_error(field, "must be a date formatted YYYY-MM-DD"))
}

/// Times travel as "HH:MM"; returned zero-padded
pub fn parse_time(field: &str, value: &str) -> Result<String, ApiError> {
    let time = NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| field_error(field, "must be a time formatted HH:MM"))?;
    Ok(time.format("%H:%M").to_string())
}

/// Legacy single-field form "HH:MM-HH:MM", split into a start/end pair
pub fn parse_time_range(field: &str, value: &str) -> Result<(String, String), ApiError> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| field_error(field, "must be a time range formatted HH:MM-HH:MM"))?;
    Ok((parse_time(field, start.trim())?, parse_time(field, end.trim())?))
}

/// Slot times must be ordered; equality is as wrong as reversal
pub fn check_time_order(start: &str, end: &str) -> Result<(), ApiError> {
    if start < end {
        Ok(())
    } else {
        Err(field_error("end_time", "must be after start_time"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::student::Sex;

    #[test]
    fn missing_fields_are_all_reported() {
        let err = require_fields(&[("name", true), ("surname", false), ("matricule", false)])
            .unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(fields), .. } => {
                assert!(!fields.contains_key("name"));
                assert!(fields.contains_key("surname"));
                assert!(fields.contains_key("matricule"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn sex_must_be_m_or_f() {
        assert!(parse_enum::<Sex>("sex", "M").is_ok());
        assert!(parse_enum::<Sex>("sex", "F").is_ok());
        assert!(parse_enum::<Sex>("sex", "x").is_err());
    }

    #[test]
    fn dates_and_times_parse_strictly() {
        assert!(parse_date("date", "2025-09-01").is_ok());
        assert!(parse_date("date", "01/09/2025").is_err());
        assert_eq!(parse_time("start_time", "8:05").unwrap(), "08:05");
        assert!(parse_time("start_time", "8h05").is_err());
    }

    #[test]
    fn time_range_splits_and_validates() {
        let (start, end) = parse_time_range("time_range", "8:00-10:30").unwrap();
        assert_eq!(start, "08:00");
        assert_eq!(end, "10:30");
        assert!(parse_time_range("time_range", "8:00").is_err());
    }

    #[test]
    fn slot_times_must_be_ordered() {
        assert!(check_time_order("08:00", "10:00").is_ok());
        assert!(check_time_order("10:00", "08:00").is_err());
        assert!(check_time_order("08:00", "08:00").is_err());
    }
}
