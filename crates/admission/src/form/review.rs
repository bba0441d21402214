use serde::Serialize;

use super::fields::{self, ID_PROOFS, PHOTO, SIGNATURE};
use super::{FormState, Step};

/// One labelled value on the review page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEntry {
    pub field: &'static str,
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSection {
    pub step: Step,
    pub title: &'static str,
    pub entries: Vec<ReviewEntry>,
}

/// Read-only projection of the form for the review step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub sections: Vec<ReviewSection>,
    /// Attachment slot, and a short status line for it.
    pub attachments: Vec<ReviewEntry>,
}

impl ReviewSummary {
    pub fn from_state(state: &FormState) -> Self {
        let sections = [Step::Identity, Step::Guardian, Step::Hostel]
            .into_iter()
            .map(|step| ReviewSection {
                step,
                title: step.title(),
                entries: step
                    .fields()
                    .iter()
                    .map(|&field| ReviewEntry {
                        field,
                        label: fields::label(field),
                        value: state.value(field).unwrap_or_default().to_string(),
                    })
                    .collect(),
            })
            .collect();

        let attachment = |field: &'static str, status: String| ReviewEntry {
            field,
            label: fields::label(field),
            value: status,
        };
        let proofs = state.id_proofs().len();
        let attachments = vec![
            attachment(
                ID_PROOFS,
                match proofs {
                    0 => "Not uploaded".to_string(),
                    1 => "1 document".to_string(),
                    n => format!("{n} documents"),
                },
            ),
            attachment(
                PHOTO,
                if state.photo().is_some() { "Captured" } else { "Not captured" }.to_string(),
            ),
            attachment(
                SIGNATURE,
                if state.signature().is_some() { "Provided" } else { "Not provided" }.to_string(),
            ),
        ];

        Self {
            sections,
            attachments,
        }
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.sections
            .iter()
            .flat_map(|s| &s.entries)
            .chain(&self.attachments)
            .find(|e| e.field == field)
            .map(|e| e.value.as_str())
    }
}

/// Display collaborator refreshed whenever the controller lands on the review step.
pub trait ReviewRenderer: Send {
    fn render(&mut self, summary: &ReviewSummary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::fields::{EMERGENCY_CONTACT, FULL_NAME};

    #[test]
    fn projects_values_and_attachment_status() {
        let mut state = FormState::new();
        state.set_value(FULL_NAME, "Asha Rao");
        state.add_id_proof("a").unwrap();
        state.add_id_proof("b").unwrap();

        let summary = ReviewSummary::from_state(&state);
        assert_eq!(summary.sections.len(), 3);
        assert_eq!(summary.sections[0].title, "Student Details");
        assert_eq!(summary.value(FULL_NAME), Some("Asha Rao"));
        assert_eq!(summary.value(EMERGENCY_CONTACT), Some(""));
        assert_eq!(summary.value(ID_PROOFS), Some("2 documents"));
        assert_eq!(summary.value(PHOTO), Some("Not captured"));
    }
}
