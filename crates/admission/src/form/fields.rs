//! Wire names of the intake form fields.

pub const FULL_NAME: &str = "fullName";
pub const DATE_OF_BIRTH: &str = "dateOfBirth";
pub const GENDER: &str = "gender";
pub const EMAIL: &str = "email";
pub const PHONE: &str = "phone";
pub const ADDRESS: &str = "address";

pub const GUARDIAN_NAME: &str = "guardianName";
pub const RELATION: &str = "relation";
pub const GUARDIAN_PHONE: &str = "guardianPhone";
pub const EMERGENCY_CONTACT: &str = "emergencyContact";

pub const ROOM_NUMBER: &str = "roomNumber";
pub const ADMISSION_DATE: &str = "admissionDate";
pub const STAY_DURATION: &str = "stayDuration";

pub const PHOTO: &str = "photo";
pub const SIGNATURE: &str = "signature";
pub const ID_PROOFS: &str = "idProofs";

/// Keys that must never reach persistent storage.
pub const CREDENTIAL_FIELDS: [&str; 3] = ["password", "token", "apiKey"];

/// Text fields counted by the completion percentage.
pub const REQUIRED_TEXT_FIELDS: [&str; 12] = [
    FULL_NAME,
    DATE_OF_BIRTH,
    GENDER,
    EMAIL,
    PHONE,
    ADDRESS,
    GUARDIAN_NAME,
    RELATION,
    GUARDIAN_PHONE,
    ROOM_NUMBER,
    ADMISSION_DATE,
    STAY_DURATION,
];

/// Human-readable label, falling back to the wire name.
pub fn label(field: &str) -> &str {
    match field {
        FULL_NAME => "Full Name",
        DATE_OF_BIRTH => "Date of Birth",
        GENDER => "Gender",
        EMAIL => "Email",
        PHONE => "Phone",
        ADDRESS => "Address",
        GUARDIAN_NAME => "Guardian Name",
        RELATION => "Relation",
        GUARDIAN_PHONE => "Guardian Phone",
        EMERGENCY_CONTACT => "Emergency Contact",
        ROOM_NUMBER => "Room Number",
        ADMISSION_DATE => "Admission Date",
        STAY_DURATION => "Stay Duration",
        PHOTO => "Photo",
        SIGNATURE => "Signature",
        ID_PROOFS => "ID Proofs",
        other => other,
    }
}
