use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::codec::{Codec, CodecError};
use crate::form::FormState;

/// Why a stored draft could not be turned back into a record.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decompression failed: {0}")]
    Codec(#[from] CodecError),

    #[error("record has no formData")]
    MissingFormData,

    #[error("unparseable timestamp {0:?}")]
    BadTimestamp(String),

    #[error("record carries more ID proofs than allowed")]
    TooManyIdProofs,
}

/// Persisted snapshot of the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub form_data: FormState,
    pub timestamp: String,
    pub version: String,
}

impl DraftRecord {
    pub fn new(form_data: FormState, at: DateTime<Utc>, version: impl Into<String>) -> Self {
        Self {
            form_data,
            timestamp: format_timestamp(at),
            version: version.into(),
        }
    }

    pub fn saved_at(&self) -> Result<DateTime<Utc>, DecodeError> {
        parse_timestamp(&self.timestamp)
    }
}

/// Wrapper written when compression is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedEnvelope {
    pub compressed: bool,
    pub data: String,
    pub original_size: usize,
    pub compressed_size: usize,
    /// Absent on records written before the escaped codec existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<Codec>,
}

impl CompressedEnvelope {
    pub fn wrap(json: &str, codec: Codec) -> Self {
        let data = codec.compress(json);
        Self {
            compressed: true,
            original_size: json.len(),
            compressed_size: data.len(),
            data,
            codec: Some(codec),
        }
    }

    pub fn unwrap_json(&self) -> Result<String, CodecError> {
        self.codec.unwrap_or(Codec::Legacy).decompress(&self.data)
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DecodeError::BadTimestamp(raw.to_string()))
}

/// Serialize a record for storage, compressed or plain.
pub fn encode(record: &DraftRecord, compress: Option<Codec>) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(record)?;
    match compress {
        Some(codec) => serde_json::to_string(&CompressedEnvelope::wrap(&json, codec)),
        None => Ok(json),
    }
}

/// Reverse [`encode`] and check the record's shape.
///
/// Expiry is not checked here; that depends on the reader's clock.
pub fn decode(stored: &str) -> Result<DraftRecord, DecodeError> {
    let mut value: Value = serde_json::from_str(stored)?;
    if value.get("compressed").and_then(Value::as_bool) == Some(true) {
        let envelope: CompressedEnvelope = serde_json::from_value(value)?;
        value = serde_json::from_str(&envelope.unwrap_json()?)?;
    }

    let form_data = match value.get_mut("formData").map(Value::take) {
        Some(Value::Null) | None => return Err(DecodeError::MissingFormData),
        Some(v) => serde_json::from_value::<FormState>(v)?,
    };
    let timestamp = value
        .get("timestamp")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::BadTimestamp(String::new()))?
        .to_string();
    parse_timestamp(&timestamp)?;
    if !form_data.within_bounds() {
        return Err(DecodeError::TooManyIdProofs);
    }
    let version = value
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(DraftRecord {
        form_data,
        timestamp,
        version,
    })
}
