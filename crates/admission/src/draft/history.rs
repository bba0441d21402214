use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{format_timestamp, parse_timestamp};
use crate::form::FormState;

/// What the backend said about one submission attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
}

impl SubmissionOutcome {
    pub fn succeeded(application_id: Option<String>) -> Self {
        Self {
            success: true,
            error: None,
            application_id,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            application_id: None,
        }
    }
}

/// One recorded submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub form_data: FormState,
    pub submission_result: SubmissionOutcome,
    pub timestamp: String,
    pub success: bool,
}

impl HistoryEntry {
    pub fn new(form_data: FormState, outcome: SubmissionOutcome, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            form_data,
            success: outcome.success,
            submission_result: outcome,
            timestamp: format_timestamp(at),
        }
    }

    /// Entries with an unreadable timestamp count as infinitely old.
    pub fn is_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        match parse_timestamp(&self.timestamp) {
            Ok(at) => now - at >= max_age,
            Err(_) => true,
        }
    }
}

/// Newest-first list capped at `limit`.
pub fn push_front(history: &mut Vec<HistoryEntry>, entry: HistoryEntry, limit: usize) {
    history.insert(0, entry);
    history.truncate(limit);
}
