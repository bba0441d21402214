//! Field, step and form validation for the intake form.

mod debounce;
pub mod messages;
mod rules;
pub mod validators;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

pub use debounce::{DEFAULT_DEBOUNCE, FieldReport, ValidationDebouncer};
pub use rules::{ValidationRule, default_rules};

use crate::clock::{Clock, SystemClock};
use crate::errors::ValidationError;
use crate::form::fields::{EMERGENCY_CONTACT, GUARDIAN_PHONE, PHONE};
use crate::form::{FormState, Step};

/// Inputs a named validator may depend on besides the value itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub now: DateTime<Utc>,
}

impl ValidationContext {
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}

/// Named validator: returns an error message, or `None` when the value passes.
pub type CustomValidator = Arc<dyn Fn(&str, &ValidationContext) -> Option<String> + Send + Sync>;

/// Aggregate result of a whole-form check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub error_count: usize,
    pub errors: Vec<ValidationError>,
    pub completion_percentage: u8,
}

/// Rule table plus a registry of named validators.
///
/// Fields without a rule always pass.
pub struct Validator {
    rules: HashMap<String, ValidationRule>,
    validators: HashMap<String, CustomValidator>,
    clock: Arc<dyn Clock>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Validator {
    /// Validator loaded with the intake form's rules and built-in validators.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let mut validator = Self::empty(clock);
        validator.rules = default_rules();
        validator.register_validator(validators::NAME_VALIDATOR, validators::validate_name);
        validator.register_validator(
            validators::DATE_OF_BIRTH_VALIDATOR,
            validators::validate_date_of_birth,
        );
        validator.register_validator(
            validators::ADMISSION_DATE_VALIDATOR,
            validators::validate_admission_date,
        );
        validator
    }

    /// Validator without rules or named validators.
    pub fn empty(clock: Arc<dyn Clock>) -> Self {
        Self {
            rules: HashMap::new(),
            validators: HashMap::new(),
            clock,
        }
    }

    pub fn context(&self) -> ValidationContext {
        ValidationContext {
            now: self.clock.now(),
        }
    }

    pub fn rule(&self, field: &str) -> Option<&ValidationRule> {
        self.rules.get(field)
    }

    /// Replace the rule for `field`.
    pub fn add_rule(&mut self, field: impl Into<String>, rule: ValidationRule) {
        self.rules.insert(field.into(), rule);
    }

    /// Adjust the rule for `field` in place, starting from an optional rule when none exists.
    pub fn update_rule(&mut self, field: &str, f: impl FnOnce(&mut ValidationRule)) {
        f(self.rules.entry(field.to_string()).or_default());
    }

    pub fn register_validator<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, &ValidationContext) -> Option<String> + Send + Sync + 'static,
    {
        self.validators.insert(name.into(), Arc::new(f));
    }

    /// Check one value against its field rule. The first failing check wins.
    pub fn validate_field(&self, field: &str, value: &str) -> Result<(), ValidationError> {
        let Some(rule) = self.rules.get(field) else {
            return Ok(());
        };
        let value = value.trim();
        let fail = |message: String| Err(ValidationError::new(field, message));

        if value.is_empty() {
            return if rule.required {
                fail(messages::REQUIRED.into())
            } else {
                Ok(())
            };
        }

        let len = value.chars().count();
        if let Some(min) = rule.min_length.filter(|min| len < *min) {
            return fail(messages::min_length(min));
        }
        if let Some(max) = rule.max_length.filter(|max| len > *max) {
            return fail(messages::max_length(max));
        }

        if let Some(re) = &rule.pattern {
            if !re.is_match(value) {
                let message = rule.pattern_message.as_deref().unwrap_or(messages::PATTERN);
                return fail(message.into());
            }
        }

        if let Some(allowed) = &rule.allowed_values {
            let lowered = value.to_lowercase();
            if !allowed.iter().any(|v| *v == lowered) {
                return fail(messages::ALLOWED_VALUES.into());
            }
        }

        if let Some(name) = &rule.custom_validator {
            match self.validators.get(name) {
                Some(check) => {
                    if let Some(message) = check(value, &self.context()) {
                        return fail(message);
                    }
                }
                None => tracing::debug!(field, validator = %name, "unknown custom validator skipped"),
            }
        }

        Ok(())
    }

    /// Checks spanning several fields: the guardian and emergency numbers must
    /// differ from the student's own phone.
    pub fn validate_cross_fields(&self, state: &FormState) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let Some(phone) = state.trimmed(PHONE) else {
            return errors;
        };
        if state.trimmed(GUARDIAN_PHONE) == Some(phone) {
            errors.push(ValidationError::new(
                GUARDIAN_PHONE,
                messages::GUARDIAN_PHONE_DUPLICATE,
            ));
        }
        if state.trimmed(EMERGENCY_CONTACT) == Some(phone) {
            errors.push(ValidationError::new(
                EMERGENCY_CONTACT,
                messages::EMERGENCY_CONTACT_DUPLICATE,
            ));
        }
        errors
    }

    /// Errors that block leaving `step`: rules of its required fields and its
    /// attachment slot. Optional fields and cross-field checks are left to
    /// [`Validator::validate_form`].
    pub fn validate_step(&self, step: Step, state: &FormState) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = step
            .required_fields()
            .iter()
            .filter_map(|field| {
                self.validate_field(field, state.value(field).unwrap_or_default())
                    .err()
            })
            .collect();

        if let Some((field, message)) = step.missing_attachment(state) {
            errors.push(ValidationError::new(field, message));
        }
        errors
    }

    /// Every field rule in step order, then rule-bearing fields outside the
    /// steps, then the cross-field checks.
    pub fn validate_form(&self, state: &FormState) -> Vec<ValidationError> {
        let step_fields: Vec<&str> = Step::ALL.iter().flat_map(|s| s.fields()).copied().collect();
        let mut extra: Vec<&str> = self
            .rules
            .keys()
            .map(String::as_str)
            .filter(|f| !step_fields.contains(f))
            .collect();
        extra.sort_unstable();

        let mut errors: Vec<ValidationError> = step_fields
            .into_iter()
            .chain(extra)
            .filter_map(|field| {
                self.validate_field(field, state.value(field).unwrap_or_default())
                    .err()
            })
            .collect();
        errors.extend(self.validate_cross_fields(state));
        errors
    }

    pub fn summary(&self, state: &FormState) -> ValidationSummary {
        let errors = self.validate_form(state);
        ValidationSummary {
            is_valid: errors.is_empty(),
            error_count: errors.len(),
            errors,
            completion_percentage: state.completion_percentage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::form::fields::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn validator() -> Validator {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        Validator::new(Arc::new(ManualClock::new(now)))
    }

    fn message(result: Result<(), ValidationError>) -> Option<String> {
        result.err().map(|e| e.message)
    }

    #[test]
    fn empty_required_field_is_invalid() {
        let v = validator();
        assert_eq!(
            message(v.validate_field(FULL_NAME, "   ")).as_deref(),
            Some(messages::REQUIRED)
        );
        assert_eq!(v.validate_field(EMERGENCY_CONTACT, ""), Ok(()));
    }

    #[test]
    fn unknown_field_always_passes() {
        assert_eq!(validator().validate_field("favouriteColour", ""), Ok(()));
    }

    #[test]
    fn email_checks() {
        let v = validator();
        assert_eq!(v.validate_field(EMAIL, "a@b.co"), Ok(()));
        assert_eq!(
            message(v.validate_field(EMAIL, "a@b")).as_deref(),
            Some(messages::EMAIL)
        );
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            message(v.validate_field(EMAIL, &long)),
            Some(messages::max_length(255))
        );
    }

    #[test]
    fn length_is_checked_before_pattern() {
        let v = validator();
        assert_eq!(
            message(v.validate_field(PHONE, "12345")),
            Some(messages::min_length(10))
        );
        assert_eq!(
            message(v.validate_field(PHONE, "phone number!")).as_deref(),
            Some(messages::PHONE)
        );
        assert_eq!(v.validate_field(PHONE, "+91 98765 43210"), Ok(()));
    }

    #[test]
    fn allowed_values_ignore_case() {
        let v = validator();
        assert_eq!(v.validate_field(GENDER, "Female"), Ok(()));
        assert_eq!(
            message(v.validate_field(RELATION, "uncle")).as_deref(),
            Some(messages::ALLOWED_VALUES)
        );
    }

    #[test]
    fn custom_validator_runs_last() {
        let v = validator();
        assert_eq!(
            message(v.validate_field(FULL_NAME, "Asha")).as_deref(),
            Some("Please enter both first and last name")
        );
        assert_eq!(
            message(v.validate_field(DATE_OF_BIRTH, "2016-10-16")).as_deref(),
            Some("Must be at least 16 years old")
        );
        assert_eq!(v.validate_field(DATE_OF_BIRTH, "2006-10-16"), Ok(()));
    }

    #[test]
    fn added_rules_and_validators_are_used() {
        let mut v = validator();
        v.register_validator("noRoomZero", |value, _| {
            (value == "0").then(|| "Room 0 does not exist".to_string())
        });
        v.update_rule(ROOM_NUMBER, |rule| rule.custom_validator = Some("noRoomZero".into()));
        assert_eq!(
            message(v.validate_field(ROOM_NUMBER, "0")).as_deref(),
            Some("Room 0 does not exist")
        );

        v.add_rule("nickname", ValidationRule::required().max_length(3));
        assert_eq!(
            message(v.validate_field("nickname", "Ashu")),
            Some(messages::max_length(3))
        );
    }

    #[test]
    fn guardian_step_ignores_optional_and_cross_field_errors() {
        let v = validator();
        let mut state = FormState::new();
        state.set_value(PHONE, "9876543210");
        state.set_value(GUARDIAN_NAME, "Ravi Rao");
        state.set_value(RELATION, "father");
        state.set_value(GUARDIAN_PHONE, "9876543210");
        state.set_value(EMERGENCY_CONTACT, "not a number");

        assert_eq!(v.validate_step(Step::Guardian, &state), vec![]);

        let form_errors = v.validate_form(&state);
        assert!(form_errors.contains(&ValidationError::new(
            GUARDIAN_PHONE,
            messages::GUARDIAN_PHONE_DUPLICATE
        )));
        assert!(form_errors.iter().any(|e| e.field == EMERGENCY_CONTACT));

        state.set_value(GUARDIAN_PHONE, "12");
        let errors = v.validate_step(Step::Guardian, &state);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, GUARDIAN_PHONE);
    }

    #[test]
    fn id_proof_step_needs_an_attachment() {
        let v = validator();
        let mut state = FormState::new();
        let errors = v.validate_step(Step::IdProofs, &state);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, ID_PROOFS);

        state.add_id_proof("data:image/png;base64,AAAA").unwrap();
        assert!(v.validate_step(Step::IdProofs, &state).is_empty());
    }

    #[test]
    fn summary_of_empty_form() {
        let summary = validator().summary(&FormState::new());
        assert!(!summary.is_valid);
        assert_eq!(summary.error_count, 12);
        assert_eq!(summary.completion_percentage, 0);
    }

    #[test]
    fn summary_serializes_errors() {
        let mut state = FormState::new();
        state.set_value(FULL_NAME, "Asha");
        let summary = validator().summary(&state);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(json["errorCount"], summary.error_count);
        assert_eq!(json["errors"][0]["field"], FULL_NAME);
        assert_eq!(
            json["errors"][0]["message"],
            "Please enter both first and last name"
        );
    }
}
