//! Draft store on top of the directory-backed key-value store.

use std::fs;
use std::sync::Arc;

use admission::config::DraftSettings;
use admission::draft::{DRAFT_KEY, HISTORY_KEY, SubmissionOutcome};
use admission::form::MAX_ID_PROOFS;
use admission::form::fields::{EMAIL, FULL_NAME};
use admission::{DraftStore, FileStore, FormState, KeyValueStore, ManualClock};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap(),
    ))
}

fn state() -> FormState {
    let mut state = FormState::new();
    state.set_value(FULL_NAME, "Asha Rao");
    state.set_value(EMAIL, "asha@example.com");
    state.set_value("token", "secret");
    state
}

#[test]
fn drafts_persist_across_store_instances() {
    let dir = TempDir::new().unwrap();
    let clock = clock();

    let mut drafts = DraftStore::new(FileStore::open(dir.path()).unwrap()).with_clock(clock.clone());
    assert!(drafts.save_draft(&state()));
    assert!(dir.path().join(format!("{DRAFT_KEY}.json")).exists());

    let mut reopened = DraftStore::new(FileStore::open(dir.path()).unwrap()).with_clock(clock.clone());
    let loaded = reopened.load_draft().expect("draft present");
    assert_eq!(loaded.value(FULL_NAME), Some("Asha Rao"));
    assert_eq!(loaded.value("token"), None);
}

#[test]
fn corrupted_file_is_removed_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(format!("{DRAFT_KEY}.json"));
    fs::write(&path, "{\"formData\": ").unwrap();

    let mut drafts = DraftStore::new(FileStore::open(dir.path()).unwrap()).with_clock(clock());
    assert!(drafts.has_draft());
    assert_eq!(drafts.load_draft(), None);
    assert!(!path.exists());
}

#[test]
fn non_utf8_file_is_removed_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(format!("{DRAFT_KEY}.json"));
    fs::write(&path, [0xff, 0xfe]).unwrap();

    let mut drafts = DraftStore::new(FileStore::open(dir.path()).unwrap()).with_clock(clock());
    assert_eq!(drafts.load_draft(), None);
    assert!(!path.exists());
    assert!(!drafts.has_draft());
}

#[test]
fn five_id_proofs_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut drafts = DraftStore::new(FileStore::open(dir.path()).unwrap()).with_clock(clock());
    let mut full = state();
    for i in 0..MAX_ID_PROOFS {
        full.add_id_proof(format!("data:image/png;base64,proof{i}")).unwrap();
    }
    assert!(drafts.save_draft(&full));

    let loaded = drafts.load_draft().expect("draft present");
    assert_eq!(loaded.id_proofs().len(), MAX_ID_PROOFS);
    assert_eq!(loaded.id_proofs(), full.id_proofs());
}

#[test]
fn stored_sixth_id_proof_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(format!("{DRAFT_KEY}.json"));
    let proofs: Vec<String> = (0..=MAX_ID_PROOFS)
        .map(|i| format!("data:image/png;base64,proof{i}"))
        .collect();
    let record = serde_json::json!({
        "formData": { "fullName": "Asha Rao", "idProofs": proofs },
        "timestamp": "2026-10-16T11:00:00.000Z",
        "version": "1.0.0",
    });
    fs::write(&path, record.to_string()).unwrap();

    let mut drafts = DraftStore::new(FileStore::open(dir.path()).unwrap()).with_clock(clock());
    assert!(drafts.has_draft());
    assert_eq!(drafts.load_draft(), None);
    assert!(!path.exists());
}

#[test]
fn quota_on_disk_triggers_history_cleanup() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    let settings = DraftSettings {
        compression_enabled: false,
        ..DraftSettings::default()
    };

    let mut seed = DraftStore::new(FileStore::open(dir.path()).unwrap())
        .with_clock(clock.clone())
        .with_settings(settings.clone());
    let mut bulky = state();
    bulky.set_value("address", "z".repeat(4_000));
    seed.save_to_history(&bulky, SubmissionOutcome::failed("offline"));
    let history_size = seed.store().total_size().unwrap();

    clock.advance(chrono::Duration::days(40));
    let store = FileStore::open(dir.path()).unwrap().with_quota(history_size + 100);
    let mut drafts = DraftStore::new(store)
        .with_clock(clock.clone())
        .with_settings(settings);

    let mut big_draft = state();
    big_draft.set_value("address", "q".repeat(1_000));
    assert!(drafts.save_draft(&big_draft));
    assert!(drafts.history().is_empty());
    assert_eq!(drafts.store().get(HISTORY_KEY).unwrap().as_deref(), Some("[]"));
}

#[test]
fn usage_reports_every_key() {
    let dir = TempDir::new().unwrap();
    let mut drafts = DraftStore::new(FileStore::open(dir.path()).unwrap()).with_clock(clock());
    drafts.save_draft(&state());
    drafts.save_to_history(&state(), SubmissionOutcome::default());

    let usage = drafts.storage_usage().unwrap();
    assert_eq!(usage.items.len(), 2);
    assert!(usage.items.contains_key(DRAFT_KEY));
    assert!(usage.items.contains_key(HISTORY_KEY));
    assert_eq!(usage.total_size, usage.items.values().sum::<usize>());
}
