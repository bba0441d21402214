//! Integration tests for the SettingsStore:
//! - Recursive diffing (nested structs)
//! - Persisting only changed (delta) fields
//! - Reloading after external file modification
//! - Section validation on register and update

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use settings::{Settings, SettingsError, SettingsStore};
use tempfile::TempDir;

fn settings_path(dir: &TempDir) -> PathBuf {
    dir.path().join("intake.settings.ron")
}

fn string_keys(map: &ron::value::Map) -> HashSet<String> {
    map.iter()
        .filter_map(|(k, _)| match k {
            ron::Value::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

fn section<'a>(root: &'a std::collections::HashMap<String, ron::Value>, name: &str) -> &'a ron::value::Map {
    match root.get(name) {
        Some(ron::Value::Map(m)) => m,
        other => panic!("{name} entry should be a map, got {other:?}"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Retention {
    enabled: bool,
    days: u32,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            enabled: true,
            days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Drafts {
    history_limit: u32,
    retention: Retention,
}

impl Default for Drafts {
    fn default() -> Self {
        Self {
            history_limit: 10,
            retention: Retention::default(),
        }
    }
}

impl Settings for Drafts {
    const SECTION: &'static str = "drafts";

    fn validate(&self) -> Result<(), SettingsError> {
        if self.history_limit == 0 {
            return Err(SettingsError::Validation {
                section: Self::SECTION,
                reason: "history_limit must be positive".into(),
            });
        }
        Ok(())
    }
}

#[test]
fn register_get_update_delta_flat_and_nested() {
    let dir = TempDir::new().expect("tempdir");
    let path = settings_path(&dir);

    let store = SettingsStore::builder()
        .with_settings_file(path.clone())
        .build()
        .expect("build store");
    store.register::<Drafts>().expect("register drafts");

    assert!(!path.exists(), "no file before first update");

    let drafts = store.get::<Drafts>().expect("get initial");
    assert_eq!(*drafts, Drafts::default());

    store
        .update::<Drafts, _>(|d| d.retention.days = 3)
        .expect("update retention.days");

    let content = fs::read_to_string(&path).expect("read delta file");
    let root: std::collections::HashMap<String, ron::Value> =
        ron::from_str(&content).expect("parse delta RON");
    let drafts_delta = section(&root, "drafts");

    let top_keys = string_keys(drafts_delta);
    assert!(!top_keys.contains("history_limit"), "unchanged field must not be persisted");
    assert!(top_keys.contains("retention"));

    let nested = drafts_delta
        .iter()
        .find(|(k, _)| matches!(k, ron::Value::String(s) if s == "retention"))
        .map(|(_, v)| v)
        .expect("retention delta");
    let ron::Value::Map(nested_map) = nested else {
        panic!("retention delta should be a map");
    };
    let nested_keys = string_keys(nested_map);
    assert!(nested_keys.contains("days"));
    assert!(!nested_keys.contains("enabled"));

    let drafts = store.get::<Drafts>().expect("get after update");
    assert_eq!(drafts.retention.days, 3);
    assert_eq!(drafts.history_limit, 10);
}

#[test]
fn resetting_to_default_removes_section_from_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = settings_path(&dir);
    let store = SettingsStore::builder()
        .with_settings_file(path.clone())
        .build()
        .expect("build");
    store.register::<Drafts>().expect("register");

    store.update::<Drafts, _>(|d| d.history_limit = 3).expect("diverge");
    store.update::<Drafts, _>(|d| d.history_limit = 10).expect("restore");

    let content = fs::read_to_string(&path).expect("read");
    let root: std::collections::HashMap<String, ron::Value> =
        ron::from_str(&content).expect("parse");
    assert!(root.is_empty());
}

#[test]
fn reload_applies_external_changes() {
    let dir = TempDir::new().expect("tempdir");
    let path = settings_path(&dir);

    let store = SettingsStore::builder()
        .with_settings_file(path.clone())
        .build()
        .expect("build");
    store.register::<Drafts>().expect("register");
    store.update::<Drafts, _>(|d| d.history_limit = 5).expect("initial update");

    let external = r#"
    {
        "drafts": {
            "history_limit": 20,
            "retention": { "enabled": false }
        }
    }
    "#;
    fs::write(&path, external).expect("write external delta");

    store.reload().expect("reload");

    let drafts = store.get::<Drafts>().expect("get after reload");
    assert_eq!(drafts.history_limit, 20);
    assert!(!drafts.retention.enabled);
    assert_eq!(drafts.retention.days, 7, "unchanged nested value keeps default");
}

#[test]
fn invalid_update_is_rejected_and_not_persisted() {
    let dir = TempDir::new().expect("tempdir");
    let path = settings_path(&dir);
    let store = SettingsStore::builder()
        .with_settings_file(path.clone())
        .build()
        .expect("build");
    store.register::<Drafts>().expect("register");

    let err = store
        .update::<Drafts, _>(|d| d.history_limit = 0)
        .expect_err("zero limit rejected");
    assert!(matches!(err, SettingsError::Validation { section: "drafts", .. }));
    assert!(!path.exists());
    assert_eq!(store.get::<Drafts>().expect("get").history_limit, 10);
}

#[test]
fn invalid_file_delta_fails_registration() {
    let dir = TempDir::new().expect("tempdir");
    let path = settings_path(&dir);
    fs::write(&path, r#"{ "drafts": { "history_limit": 0 } }"#).expect("seed");

    let store = SettingsStore::builder()
        .with_settings_file(path)
        .build()
        .expect("build");
    assert!(store.register::<Drafts>().is_err());
    assert!(!store.is_registered::<Drafts>());
}

#[test]
fn prune_stale_drops_unknown_sections_and_keys() {
    let dir = TempDir::new().expect("tempdir");
    let path = settings_path(&dir);
    fs::write(
        &path,
        r#"{ "drafts": { "history_limit": 4, "legacy_flag": true }, "theme": { "dark": true } }"#,
    )
    .expect("seed");

    let store = SettingsStore::builder()
        .with_settings_file(path.clone())
        .build()
        .expect("build");
    store.register::<Drafts>().expect("register");
    store.prune_stale().expect("prune");

    let content = fs::read_to_string(&path).expect("read");
    let root: std::collections::HashMap<String, ron::Value> =
        ron::from_str(&content).expect("parse");
    assert_eq!(root.len(), 1);
    let keys = string_keys(section(&root, "drafts"));
    assert_eq!(keys, HashSet::from(["history_limit".to_string()]));
}
