use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::messages;
use super::validators::{ADMISSION_DATE_VALIDATOR, DATE_OF_BIRTH_VALIDATOR, NAME_VALIDATOR};
use crate::form::fields::*;

lazy_static! {
    pub(crate) static ref NAME_RE: Regex = Regex::new(r"^[a-zA-Z\s'-]+$").expect("name pattern");
    pub(crate) static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern");
    pub(crate) static ref PHONE_RE: Regex = Regex::new(
        r"^[\+]?[(]?[\+]?\d{0,3}[)]?[-\s\.]?\d{1,4}[-\s\.]?\d{1,4}[-\s\.]?\d{1,4}[-\s\.]?\d{1,9}$"
    )
    .expect("phone pattern");
}

/// Static constraints attached to one field.
///
/// Checks run in a fixed order: length, pattern, allowed values, named custom
/// validator. The first failure is the only one reported.
#[derive(Debug, Clone, Default)]
pub struct ValidationRule {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    /// Message used when `pattern` does not match; falls back to the generic one.
    pub pattern_message: Option<String>,
    /// Lower-case options; input is compared case-insensitively.
    pub allowed_values: Option<Vec<String>>,
    pub custom_validator: Option<String>,
}

impl ValidationRule {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, re: Regex, message: impl Into<String>) -> Self {
        self.pattern = Some(re);
        self.pattern_message = Some(message.into());
        self
    }

    pub fn allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_values = Some(
            values
                .into_iter()
                .map(|v| v.as_ref().to_lowercase())
                .collect(),
        );
        self
    }

    pub fn custom(mut self, validator: impl Into<String>) -> Self {
        self.custom_validator = Some(validator.into());
        self
    }
}

/// The intake form's rule table.
pub fn default_rules() -> HashMap<String, ValidationRule> {
    let phone = || {
        ValidationRule::required()
            .pattern(PHONE_RE.clone(), messages::PHONE)
            .length(10, 15)
    };

    let mut rules = HashMap::new();
    let mut add = |field: &str, rule: ValidationRule| {
        rules.insert(field.to_string(), rule);
    };

    add(
        FULL_NAME,
        ValidationRule::required()
            .length(2, 100)
            .pattern(NAME_RE.clone(), messages::NAME)
            .custom(NAME_VALIDATOR),
    );
    add(
        EMAIL,
        ValidationRule::required()
            .pattern(EMAIL_RE.clone(), messages::EMAIL)
            .max_length(255),
    );
    add(PHONE, phone());
    add(ADDRESS, ValidationRule::required().length(10, 500));
    add(DATE_OF_BIRTH, ValidationRule::required().custom(DATE_OF_BIRTH_VALIDATOR));
    add(ADMISSION_DATE, ValidationRule::required().custom(ADMISSION_DATE_VALIDATOR));
    add(GENDER, ValidationRule::required().allowed(["male", "female", "other"]));
    add(
        RELATION,
        ValidationRule::required().allowed(["father", "mother", "guardian", "other"]),
    );
    add(ROOM_NUMBER, ValidationRule::required());
    add(STAY_DURATION, ValidationRule::required());
    add(
        GUARDIAN_NAME,
        ValidationRule::required()
            .length(2, 100)
            .pattern(NAME_RE.clone(), messages::NAME),
    );
    add(GUARDIAN_PHONE, phone());
    add(
        EMERGENCY_CONTACT,
        ValidationRule {
            required: false,
            ..phone()
        },
    );

    rules
}
