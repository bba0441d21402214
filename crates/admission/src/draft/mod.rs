//! Draft persistence on top of a [`KeyValueStore`].
//!
//! Every outward operation absorbs storage failures: saves report `false`,
//! loads report `None`, and the cause is logged.

mod codec;
mod file_store;
mod history;
mod kv;
mod record;
mod sanitize;

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

pub use codec::{Codec, CodecError};
pub use file_store::FileStore;
pub use history::{HistoryEntry, SubmissionOutcome};
pub use kv::{KeyValueStore, MemoryStore};
pub use record::{CompressedEnvelope, DecodeError, DraftRecord};
pub use sanitize::{
    IMAGE_SIZE_LIMIT, ImageRecoder, NoopRecoder, RecodeLimits, SIGNATURE_SIZE_LIMIT, sanitize,
};

use crate::clock::{Clock, SystemClock};
use crate::config::DraftSettings;
use crate::errors::StorageError;
use crate::form::FormState;

pub const DRAFT_KEY: &str = "hostel_admission_draft";
pub const HISTORY_KEY: &str = "hostel_admission_history";
/// Version tag written into every record.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Metadata about the stored draft, without expiry checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInfo {
    pub timestamp: String,
    pub version: String,
    pub has_photo: bool,
    pub has_signature: bool,
    pub has_id_proof: bool,
    pub completion_percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub total_size: usize,
    pub items: BTreeMap<String, usize>,
    pub available: usize,
    pub percentage: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument {
    draft: Option<FormState>,
    history: Vec<HistoryEntry>,
    export_date: String,
    version: String,
}

pub struct DraftStore<S: KeyValueStore> {
    store: S,
    clock: Arc<dyn Clock>,
    recoder: Box<dyn ImageRecoder>,
    settings: DraftSettings,
    codec: Codec,
}

impl<S: KeyValueStore> DraftStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            recoder: Box::new(NoopRecoder),
            settings: DraftSettings::default(),
            codec: Codec::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(mut self, settings: DraftSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_recoder(mut self, recoder: impl ImageRecoder + 'static) -> Self {
        self.recoder = Box::new(recoder);
        self
    }

    /// Codec used for new compressed writes. Reading always follows the stored tag.
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn settings(&self) -> &DraftSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn retention(&self) -> Duration {
        Duration::days(i64::from(self.settings.retention_days))
    }

    fn write_draft(&mut self, state: &FormState, compress: bool) -> Result<(), StorageError> {
        let record = DraftRecord::new(
            sanitize(state, self.recoder.as_ref()),
            self.clock.now(),
            FORMAT_VERSION,
        );
        let encoded = record::encode(&record, compress.then_some(self.codec))?;
        self.store.set(DRAFT_KEY, &encoded)
    }

    /// Persist a sanitized snapshot of `state`.
    ///
    /// On a quota failure, old history is purged and the write retried once
    /// with compression forced on.
    pub fn save_draft(&mut self, state: &FormState) -> bool {
        if !state.within_bounds() {
            warn!("refusing to save draft with {} ID proofs", state.id_proofs().len());
            return false;
        }

        let err = match self.write_draft(state, self.settings.compression_enabled) {
            Ok(()) => {
                info!("draft saved");
                return true;
            }
            Err(err) => err,
        };

        if !err.is_quota() {
            error!("failed to save draft: {err}");
            return false;
        }

        warn!("storage quota exceeded, attempting cleanup: {err}");
        let cleaned = self.cleanup_old_data();
        if !self.settings.compression_enabled {
            self.settings.compression_enabled = true;
            info!("enabled compression due to storage constraints");
        }
        match self.write_draft(state, true) {
            Ok(()) => {
                info!("draft saved after cleaning {cleaned} history entries");
                true
            }
            Err(err) => {
                error!("failed to save draft after cleanup: {err}");
                false
            }
        }
    }

    /// The stored draft, if one exists, is well formed and is younger than the
    /// retention window. Anything else is removed and reported as absent.
    pub fn load_draft(&mut self) -> Option<FormState> {
        let stored = match self.store.get(DRAFT_KEY) {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(StorageError::Io(err)) if err.kind() == ErrorKind::InvalidData => {
                warn!("unreadable draft data found, clearing: {err}");
                self.clear_draft();
                return None;
            }
            Err(err) => {
                error!("failed to read draft: {err}");
                return None;
            }
        };

        let record = match record::decode(&stored) {
            Ok(record) => record,
            Err(err) => {
                warn!("invalid draft data found, clearing: {err}");
                self.clear_draft();
                return None;
            }
        };

        let age = match record.saved_at() {
            Ok(saved_at) => self.clock.now() - saved_at,
            Err(err) => {
                warn!("invalid draft timestamp, clearing: {err}");
                self.clear_draft();
                return None;
            }
        };
        if age >= self.retention() {
            info!("draft expired after {} days, clearing", age.num_days());
            self.clear_draft();
            return None;
        }

        debug!("draft loaded (version {})", record.version);
        Some(record.form_data)
    }

    pub fn clear_draft(&mut self) -> bool {
        match self.store.remove(DRAFT_KEY) {
            Ok(()) => {
                debug!("draft cleared");
                true
            }
            Err(err) => {
                error!("failed to clear draft: {err}");
                false
            }
        }
    }

    pub fn has_draft(&self) -> bool {
        matches!(self.store.get(DRAFT_KEY), Ok(Some(_)))
    }

    pub fn draft_info(&self) -> Option<DraftInfo> {
        let stored = self.store.get(DRAFT_KEY).ok().flatten()?;
        let record = record::decode(&stored)
            .inspect_err(|err| warn!("failed to read draft info: {err}"))
            .ok()?;
        let form = &record.form_data;
        Some(DraftInfo {
            has_photo: form.photo().is_some(),
            has_signature: form.signature().is_some(),
            has_id_proof: !form.id_proofs().is_empty(),
            completion_percentage: form.completion_percentage(),
            timestamp: record.timestamp,
            version: record.version,
        })
    }

    /// Recorded submission attempts, newest first. Unreadable history reads as empty.
    pub fn history(&self) -> Vec<HistoryEntry> {
        match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .inspect_err(|err| warn!("failed to parse history: {err}"))
                .unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("failed to read history: {err}");
                Vec::new()
            }
        }
    }

    pub fn history_item(&self, id: &str) -> Option<HistoryEntry> {
        self.history().into_iter().find(|entry| entry.id == id)
    }

    fn write_history(&mut self, history: &[HistoryEntry]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(history)?;
        self.store.set(HISTORY_KEY, &raw)
    }

    /// Record a submission attempt. Returns the new entry's id.
    pub fn save_to_history(&mut self, state: &FormState, outcome: SubmissionOutcome) -> Option<String> {
        let entry = HistoryEntry::new(
            sanitize(state, self.recoder.as_ref()),
            outcome,
            self.clock.now(),
        );
        let id = entry.id.clone();
        let mut history = self.history();
        history::push_front(&mut history, entry, self.settings.history_limit);
        match self.write_history(&history) {
            Ok(()) => {
                info!("submission saved to history as {id}");
                Some(id)
            }
            Err(err) => {
                error!("failed to save to history: {err}");
                None
            }
        }
    }

    pub fn clear_history(&mut self) -> bool {
        match self.store.remove(HISTORY_KEY) {
            Ok(()) => true,
            Err(err) => {
                error!("failed to clear history: {err}");
                false
            }
        }
    }

    /// Drop history entries past the configured history retention.
    pub fn cleanup_old_data(&mut self) -> usize {
        let max_age = Duration::days(i64::from(self.settings.history_retention_days));
        self.cleanup_older_than(max_age)
    }

    /// Drop history entries at least `max_age` old. Returns how many were removed.
    pub fn cleanup_older_than(&mut self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let mut history = self.history();
        let before = history.len();
        history.retain(|entry| !entry.is_older_than(max_age, now));
        let cleaned = before - history.len();
        if cleaned > 0 {
            if let Err(err) = self.write_history(&history) {
                error!("failed to clean up old data: {err}");
                return 0;
            }
        }
        info!("cleaned up {cleaned} old items");
        cleaned
    }

    pub fn storage_usage(&self) -> Option<StorageUsage> {
        let entries = self
            .store
            .entries()
            .inspect_err(|err| error!("failed to get storage usage: {err}"))
            .ok()?;
        let quota = self.settings.storage_quota_bytes;
        let total_size: usize = entries.iter().map(|(_, size)| size).sum();
        Some(StorageUsage {
            total_size,
            items: entries.into_iter().collect(),
            available: quota.saturating_sub(total_size),
            percentage: if quota == 0 {
                100.0
            } else {
                total_size as f64 / quota as f64 * 100.0
            },
        })
    }

    /// Pretty-printed JSON document holding the current draft and history.
    ///
    /// Loading the draft applies the usual expiry rules first.
    pub fn export_data(&mut self) -> Option<String> {
        let document = ExportDocument {
            draft: self.load_draft(),
            history: self.history(),
            export_date: record::format_timestamp(self.clock.now()),
            version: FORMAT_VERSION.to_string(),
        };
        serde_json::to_string_pretty(&document)
            .inspect_err(|err| error!("failed to export data: {err}"))
            .ok()
    }

    /// Restore a document produced by [`DraftStore::export_data`].
    ///
    /// The draft is saved anew; imported history goes in front of the
    /// existing entries and the list is capped again.
    pub fn import_data(&mut self, raw: &str) -> bool {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                error!("failed to import data: {err}");
                return false;
            }
        };
        if value.get("version").and_then(Value::as_str).map_or(true, str::is_empty) {
            error!("failed to import data: missing version");
            return false;
        }

        if let Some(draft) = value.get("draft").filter(|d| !d.is_null()) {
            match serde_json::from_value::<FormState>(draft.clone()) {
                Ok(state) => {
                    if !self.save_draft(&state) {
                        return false;
                    }
                }
                Err(err) => {
                    error!("failed to import draft: {err}");
                    return false;
                }
            }
        }

        if let Some(imported) = value.get("history").filter(|h| h.is_array()) {
            let imported: Vec<HistoryEntry> = match serde_json::from_value(imported.clone()) {
                Ok(entries) => entries,
                Err(err) => {
                    error!("failed to import history: {err}");
                    return false;
                }
            };
            let mut merged = imported;
            merged.extend(self.history());
            merged.truncate(self.settings.history_limit);
            if let Err(err) = self.write_history(&merged) {
                error!("failed to import history: {err}");
                return false;
            }
        }

        info!("data imported");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::form::fields::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap(),
        ))
    }

    fn filled() -> FormState {
        let mut state = FormState::new();
        state.set_value(FULL_NAME, "Asha Rao");
        state.set_value(EMAIL, "asha@example.com");
        state.set_photo(Some("data:image/jpeg;base64,AAAAAAAAAAAA".into()));
        state
    }

    fn store(clock: &Arc<ManualClock>) -> DraftStore<MemoryStore> {
        DraftStore::new(MemoryStore::new()).with_clock(clock.clone())
    }

    #[test]
    fn save_then_load_twice() {
        let clock = clock();
        let mut drafts = store(&clock);
        assert!(drafts.save_draft(&filled()));
        assert!(drafts.has_draft());

        let first = drafts.load_draft();
        let second = drafts.load_draft();
        assert_eq!(first, Some(filled()));
        assert_eq!(first, second);
    }

    #[test]
    fn uncompressed_records_are_plain_json() {
        let clock = clock();
        let settings = DraftSettings {
            compression_enabled: false,
            ..DraftSettings::default()
        };
        let mut drafts = store(&clock).with_settings(settings);
        assert!(drafts.save_draft(&filled()));
        let raw = drafts.store().get(DRAFT_KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["formData"]["fullName"], "Asha Rao");
        assert_eq!(value["version"], FORMAT_VERSION);
    }

    #[test]
    fn expiry_boundary() {
        let clock = clock();
        let mut drafts = store(&clock);

        assert!(drafts.save_draft(&filled()));
        clock.advance(Duration::days(6));
        assert!(drafts.load_draft().is_some());

        clock.advance(Duration::days(1));
        assert_eq!(drafts.load_draft(), None);
        assert!(!drafts.has_draft());
    }

    #[test]
    fn corrupted_draft_is_cleared() {
        let clock = clock();
        let mut drafts = store(&clock);
        drafts.store_mut().set(DRAFT_KEY, "{\"compressed\":true,\"data\":\"*").unwrap();
        assert_eq!(drafts.load_draft(), None);
        assert!(!drafts.has_draft());
    }

    #[test]
    fn oversized_run_count_is_cleared() {
        let clock = clock();
        let mut drafts = store(&clock);
        let stored = r#"{"compressed":true,"data":"*a18446744073709551615;","codec":"rle-escaped","originalSize":0,"compressedSize":0}"#;
        drafts.store_mut().set(DRAFT_KEY, stored).unwrap();
        assert_eq!(drafts.load_draft(), None);
        assert!(!drafts.has_draft());

        let legacy = r#"{"compressed":true,"data":"a*18446744073709551615","originalSize":0,"compressedSize":0}"#;
        drafts.store_mut().set(DRAFT_KEY, legacy).unwrap();
        assert_eq!(drafts.load_draft(), None);
        assert!(!drafts.has_draft());
    }

    #[test]
    fn attachment_set_by_key_survives_reload() {
        let clock = clock();
        let mut drafts = store(&clock);
        let mut state = FormState::new();
        state.set_value(PHOTO, "data:image/jpeg;base64,AA");
        state.set_photo(Some("data:image/jpeg;base64,BB".into()));
        assert!(drafts.save_draft(&state));

        let loaded = drafts.load_draft().unwrap();
        assert_eq!(loaded.photo(), Some("data:image/jpeg;base64,BB"));
        assert_eq!(loaded, state);
    }

    #[test]
    fn quota_failure_returns_false() {
        let clock = clock();
        let mut drafts = DraftStore::new(MemoryStore::with_quota(16)).with_clock(clock.clone());
        assert!(!drafts.save_draft(&filled()));
        assert!(!drafts.has_draft());
    }

    #[test]
    fn quota_recovery_purges_old_history() {
        let clock = clock();
        let mut drafts = DraftStore::new(MemoryStore::new())
            .with_clock(clock.clone())
            .with_settings(DraftSettings {
                compression_enabled: false,
                ..DraftSettings::default()
            });

        let mut bulky = FormState::new();
        bulky.set_value(ADDRESS, "x".repeat(2_000));
        drafts.save_to_history(&bulky, SubmissionOutcome::failed("offline"));
        let history_size = drafts.store().total_size().unwrap();

        clock.advance(Duration::days(31));
        let mut state = filled();
        state.set_value(ADDRESS, "y".repeat(600));
        drafts.store_mut().set_quota(Some(history_size + 200));

        assert!(drafts.save_draft(&state));
        assert!(drafts.history().is_empty());
        assert!(drafts.settings().compression_enabled);
        assert_eq!(drafts.load_draft(), Some(state));
    }

    #[test]
    fn draft_info_reports_attachments() {
        let clock = clock();
        let mut drafts = store(&clock);
        assert_eq!(drafts.draft_info(), None);
        drafts.save_draft(&filled());
        let info = drafts.draft_info().unwrap();
        assert_eq!(info.timestamp, "2026-10-16T10:00:00.000Z");
        assert!(info.has_photo);
        assert!(!info.has_signature);
        assert!(!info.has_id_proof);
        assert_eq!(info.completion_percentage, 20);
    }

    #[test]
    fn history_lookup_and_limit() {
        let clock = clock();
        let mut drafts = store(&clock).with_settings(DraftSettings {
            history_limit: 2,
            ..DraftSettings::default()
        });
        let first = drafts
            .save_to_history(&filled(), SubmissionOutcome::failed("timeout"))
            .unwrap();
        let second = drafts
            .save_to_history(&filled(), SubmissionOutcome::succeeded(Some("APP-1".into())))
            .unwrap();
        drafts.save_to_history(&filled(), SubmissionOutcome::failed("again"));

        assert_eq!(drafts.history().len(), 2);
        assert_eq!(drafts.history_item(&first), None);
        assert!(drafts.history_item(&second).unwrap().success);
        assert!(drafts.clear_history());
        assert!(drafts.history().is_empty());
    }

    #[test]
    fn export_import_round_trip() {
        let clock = clock();
        let mut source = store(&clock);
        source.save_draft(&filled());
        source.save_to_history(&filled(), SubmissionOutcome::failed("offline"));
        let exported = source.export_data().unwrap();

        let mut target = store(&clock);
        target.save_to_history(&FormState::new(), SubmissionOutcome::default());
        assert!(target.import_data(&exported));
        assert_eq!(target.load_draft(), Some(filled()));
        let history = target.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].submission_result.error.as_deref(), Some("offline"));

        assert!(!target.import_data("{\"draft\":null}"));
        assert!(!target.import_data("not json"));
    }

    #[test]
    fn storage_usage_against_quota() {
        let clock = clock();
        let mut drafts = store(&clock).with_settings(DraftSettings {
            storage_quota_bytes: 1000,
            ..DraftSettings::default()
        });
        drafts.store_mut().set("other", &"z".repeat(250)).unwrap();
        let usage = drafts.storage_usage().unwrap();
        assert_eq!(usage.total_size, 250);
        assert_eq!(usage.available, 750);
        assert_eq!(usage.items.get("other"), Some(&250));
        assert!((usage.percentage - 25.0).abs() < f64::EPSILON);
    }
}
