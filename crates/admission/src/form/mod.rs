mod controller;
pub mod fields;
mod review;
mod steps;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use controller::FormController;
pub use review::{ReviewEntry, ReviewRenderer, ReviewSection, ReviewSummary};
pub use steps::{Step, is_step_completed};

use crate::errors::FormError;

/// Upper bound on attached ID proof documents.
pub const MAX_ID_PROOFS: usize = 5;

/// All data captured by the intake form.
///
/// Text fields live in a flat map keyed by their wire name; the three
/// attachment slots hold image data URLs. Serializes to one flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(default, rename = "idProofs")]
    id_proofs: Vec<String>,
    #[serde(flatten)]
    values: BTreeMap<String, String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field by its wire name.
    ///
    /// `photo` and `signature` go to their attachment slots and `idProofs`
    /// appends a proof, so no text value ever shadows an attachment key.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match key {
            fields::PHOTO => self.photo = Some(value),
            fields::SIGNATURE => self.signature = Some(value),
            fields::ID_PROOFS => {
                if let Err(err) = self.add_id_proof(value) {
                    warn!("ignoring ID proof: {err}");
                }
            }
            _ => {
                self.values.insert(key.to_string(), value);
            }
        }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Value with surrounding whitespace removed; `None` when absent or blank.
    pub fn trimmed(&self, key: &str) -> Option<&str> {
        self.value(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn remove_value(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    pub fn set_photo(&mut self, data_url: Option<String>) {
        self.photo = data_url;
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn set_signature(&mut self, data_url: Option<String>) {
        self.signature = data_url;
    }

    pub fn id_proofs(&self) -> &[String] {
        &self.id_proofs
    }

    /// Appends an ID proof; the sixth one is rejected, never truncated.
    pub fn add_id_proof(&mut self, data_url: impl Into<String>) -> Result<usize, FormError> {
        if self.id_proofs.len() >= MAX_ID_PROOFS {
            return Err(FormError::TooManyIdProofs { max: MAX_ID_PROOFS });
        }
        self.id_proofs.push(data_url.into());
        Ok(self.id_proofs.len())
    }

    pub fn remove_id_proof(&mut self, index: usize) -> Result<String, FormError> {
        if index >= self.id_proofs.len() {
            return Err(FormError::NoSuchIdProof(index));
        }
        Ok(self.id_proofs.remove(index))
    }

    /// Overlay `other` on top of this state (draft restore).
    ///
    /// Present values in `other` win; attachments are only replaced when
    /// `other` carries them.
    pub fn merge_from(&mut self, other: FormState) {
        self.values.extend(other.values);
        if other.photo.is_some() {
            self.photo = other.photo;
        }
        if other.signature.is_some() {
            self.signature = other.signature;
        }
        if !other.id_proofs.is_empty() {
            self.id_proofs = other.id_proofs;
        }
    }

    /// Whether the state respects the attachment bound (used on data loaded from storage).
    pub(crate) fn within_bounds(&self) -> bool {
        self.id_proofs.len() <= MAX_ID_PROOFS
    }

    pub(crate) fn id_proofs_mut(&mut self) -> &mut Vec<String> {
        &mut self.id_proofs
    }

    /// Percentage of the 12 required text fields plus the three attachment slots
    /// that carry a value.
    pub fn completion_percentage(&self) -> u8 {
        let text = fields::REQUIRED_TEXT_FIELDS
            .iter()
            .filter(|f| self.trimmed(f).is_some())
            .count();
        let attachments = [
            self.photo.is_some(),
            self.signature.is_some(),
            !self.id_proofs.is_empty(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();
        let total = fields::REQUIRED_TEXT_FIELDS.len() + 3;
        (((text + attachments) as f64 / total as f64) * 100.0).round() as u8
    }
}
