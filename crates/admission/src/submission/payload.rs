use serde::{Deserialize, Serialize};

use crate::form::FormState;
use crate::form::fields::*;

/// Body of `POST /submit-application`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub full_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub guardian_name: String,
    pub relation: String,
    pub guardian_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    pub room_number: String,
    pub admission_date: String,
    pub stay_duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub id_proofs: Vec<String>,
}

impl From<&FormState> for SubmissionPayload {
    fn from(state: &FormState) -> Self {
        let text = |field: &str| state.trimmed(field).unwrap_or_default().to_string();
        Self {
            full_name: text(FULL_NAME),
            date_of_birth: text(DATE_OF_BIRTH),
            gender: text(GENDER),
            email: text(EMAIL),
            phone: text(PHONE),
            address: text(ADDRESS),
            guardian_name: text(GUARDIAN_NAME),
            relation: text(RELATION),
            guardian_phone: text(GUARDIAN_PHONE),
            emergency_contact: state.trimmed(EMERGENCY_CONTACT).map(str::to_string),
            room_number: text(ROOM_NUMBER),
            admission_date: text(ADMISSION_DATE),
            stay_duration: text(STAY_DURATION),
            student_photo: state.photo().map(str::to_string),
            signature: state.signature().map(str::to_string),
            id_proofs: state.id_proofs().to_vec(),
        }
    }
}
