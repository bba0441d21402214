use serde::{Deserialize, Serialize};

use super::FormState;
use super::fields::*;

/// One stage of the intake form, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    Identity = 1,
    Guardian = 2,
    Hostel = 3,
    IdProofs = 4,
    Photo = 5,
    Signature = 6,
    Review = 7,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::Identity,
        Step::Guardian,
        Step::Hostel,
        Step::IdProofs,
        Step::Photo,
        Step::Signature,
        Step::Review,
    ];

    pub const FIRST: Step = Step::Identity;
    pub const LAST: Step = Step::Review;

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Step> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn next(self) -> Option<Step> {
        Self::from_number(self.number() + 1)
    }

    pub fn prev(self) -> Option<Step> {
        Self::from_number(self.number().checked_sub(1)?)
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Identity => "Student Details",
            Step::Guardian => "Guardian Details",
            Step::Hostel => "Hostel Details",
            Step::IdProofs => "ID Proofs",
            Step::Photo => "Photo",
            Step::Signature => "Signature",
            Step::Review => "Review",
        }
    }

    /// Every text field owned by this step, optional ones included.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Step::Identity => &[FULL_NAME, DATE_OF_BIRTH, GENDER, EMAIL, PHONE, ADDRESS],
            Step::Guardian => &[GUARDIAN_NAME, RELATION, GUARDIAN_PHONE, EMERGENCY_CONTACT],
            Step::Hostel => &[ROOM_NUMBER, ADMISSION_DATE, STAY_DURATION],
            Step::IdProofs | Step::Photo | Step::Signature | Step::Review => &[],
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Step::Guardian => &[GUARDIAN_NAME, RELATION, GUARDIAN_PHONE],
            other => other.fields(),
        }
    }

    /// Message for a missing attachment, for steps that collect one.
    pub fn missing_attachment(self, state: &FormState) -> Option<(&'static str, &'static str)> {
        match self {
            Step::IdProofs if state.id_proofs().is_empty() => {
                Some((ID_PROOFS, "Please upload or scan at least one ID proof"))
            }
            Step::Photo if state.photo().is_none() => Some((PHOTO, "Please capture your photo")),
            Step::Signature if state.signature().is_none() => {
                Some((SIGNATURE, "Please provide your digital signature"))
            }
            _ => None,
        }
    }
}

/// Presence check for a step's required data, independent of navigation order.
///
/// Recomputed on every call; the review step never counts as completed.
pub fn is_step_completed(step: Step, state: &FormState) -> bool {
    match step {
        Step::Identity | Step::Guardian | Step::Hostel => step
            .required_fields()
            .iter()
            .all(|f| state.trimmed(f).is_some()),
        Step::IdProofs | Step::Photo | Step::Signature => step.missing_attachment(state).is_none(),
        Step::Review => false,
    }
}
