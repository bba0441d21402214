pub const REQUIRED: &str = "This field is required";
pub const PATTERN: &str = "Please enter a valid format";
pub const EMAIL: &str = "Please enter a valid email address";
pub const PHONE: &str = "Please enter a valid phone number";
pub const NAME: &str = "Please enter a valid name (letters, spaces, hyphens, apostrophes only)";
pub const ALLOWED_VALUES: &str = "Please select a valid option";
pub const INVALID_DATE: &str = "Please enter a valid date";

pub const GUARDIAN_PHONE_DUPLICATE: &str = "Guardian phone should be different from student phone";
pub const EMERGENCY_CONTACT_DUPLICATE: &str =
    "Emergency contact should be different from student phone";

pub fn min_length(min: usize) -> String {
    format!("Must be at least {min} characters long")
}

pub fn max_length(max: usize) -> String {
    format!("Must not exceed {max} characters")
}
