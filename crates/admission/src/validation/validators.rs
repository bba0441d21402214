//! Built-in named validators.

use chrono::{DateTime, Datelike, Duration, NaiveDate};

use super::ValidationContext;
use super::rules::NAME_RE;
use super::messages;

pub const NAME_VALIDATOR: &str = "validateName";
pub const DATE_OF_BIRTH_VALIDATOR: &str = "validateDateOfBirth";
pub const ADMISSION_DATE_VALIDATOR: &str = "validateAdmissionDate";

pub const MIN_AGE: i32 = 16;
pub const MAX_AGE: i32 = 35;
pub const ADMISSION_WINDOW_DAYS: i64 = 365;

/// Accepts `YYYY-MM-DD` (date inputs) or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Completed years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

pub fn validate_name(value: &str, _ctx: &ValidationContext) -> Option<String> {
    if value.chars().count() < 2 {
        return Some("Name must be at least 2 characters".into());
    }
    if !NAME_RE.is_match(value) {
        return Some("Name can only contain letters, spaces, hyphens, and apostrophes".into());
    }
    if value.split_whitespace().count() < 2 {
        return Some("Please enter both first and last name".into());
    }
    None
}

pub fn validate_date_of_birth(value: &str, ctx: &ValidationContext) -> Option<String> {
    let Some(date) = parse_date(value) else {
        return Some(messages::INVALID_DATE.into());
    };
    let today = ctx.today();
    if date > today {
        return Some("Date of birth cannot be in the future".into());
    }
    let age = age_on(date, today);
    if age < MIN_AGE {
        return Some(format!("Must be at least {MIN_AGE} years old"));
    }
    if age > MAX_AGE {
        return Some(format!("Must be under {MAX_AGE} years old"));
    }
    None
}

pub fn validate_admission_date(value: &str, ctx: &ValidationContext) -> Option<String> {
    let Some(date) = parse_date(value) else {
        return Some(messages::INVALID_DATE.into());
    };
    if date < ctx.today() {
        return Some("Admission date cannot be in the past".into());
    }
    let latest = (ctx.now + Duration::days(ADMISSION_WINDOW_DAYS)).date_naive();
    if date > latest {
        return Some("Admission date cannot be more than one year in the future".into());
    }
    None
}
