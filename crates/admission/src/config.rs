//! Settings sections for the intake core.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use settings::{Settings, SettingsError, SettingsStore};

use crate::validation::DEFAULT_DEBOUNCE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftSettings {
    /// Drafts this old or older are discarded on load.
    pub retention_days: u32,
    pub compression_enabled: bool,
    pub history_limit: usize,
    pub history_retention_days: u32,
    pub storage_quota_bytes: usize,
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            retention_days: 7,
            compression_enabled: true,
            history_limit: 10,
            history_retention_days: 30,
            storage_quota_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Settings for DraftSettings {
    const SECTION: &'static str = "draft";

    fn validate(&self) -> Result<(), SettingsError> {
        if self.retention_days == 0 {
            return Err(SettingsError::Validation {
                section: Self::SECTION,
                reason: "retention_days must be at least 1".into(),
            });
        }
        if self.history_limit == 0 {
            return Err(SettingsError::Validation {
                section: Self::SECTION,
                reason: "history_limit must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionSettings {
    /// Base URL; `/submit-application` is appended.
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000".into(),
            timeout_secs: 30,
        }
    }
}

impl Settings for SubmissionSettings {
    const SECTION: &'static str = "submission";

    fn validate(&self) -> Result<(), SettingsError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(SettingsError::Validation {
                section: Self::SECTION,
                reason: format!("endpoint must be an http(s) URL, got {:?}", self.endpoint),
            });
        }
        if self.timeout_secs == 0 {
            return Err(SettingsError::Validation {
                section: Self::SECTION,
                reason: "timeout_secs must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Quiet period before a keystroke is validated.
    pub debounce_ms: u64,
}

impl ValidationSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl Settings for ValidationSettings {
    const SECTION: &'static str = "validation";
}

/// How the form keeps its draft while the user moves between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub auto_save: bool,
    /// Minimum gap between two automatic saves.
    pub auto_save_interval_secs: u64,
}

impl Preferences {
    /// `None` when auto-save is off.
    pub fn auto_save_interval(&self) -> Option<Duration> {
        self.auto_save
            .then(|| Duration::from_secs(self.auto_save_interval_secs))
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_save: true,
            auto_save_interval_secs: 30,
        }
    }
}

impl Settings for Preferences {
    const SECTION: &'static str = "preferences";

    fn validate(&self) -> Result<(), SettingsError> {
        if self.auto_save && self.auto_save_interval_secs == 0 {
            return Err(SettingsError::Validation {
                section: Self::SECTION,
                reason: "auto_save_interval_secs must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Store with every intake section registered.
pub fn build_settings_store(path: impl Into<PathBuf>) -> Result<SettingsStore, SettingsError> {
    let store = SettingsStore::builder().with_settings_file(path.into()).build()?;
    store.register::<DraftSettings>()?;
    store.register::<SubmissionSettings>()?;
    store.register::<ValidationSettings>()?;
    store.register::<Preferences>()?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_and_persisted_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("intake.settings.ron");

        let store = build_settings_store(&path).unwrap();
        assert_eq!(*store.get::<DraftSettings>().unwrap(), DraftSettings::default());
        store
            .update::<SubmissionSettings, _>(|s| s.timeout_secs = 5)
            .unwrap();

        let reopened = build_settings_store(&path).unwrap();
        assert_eq!(reopened.get::<SubmissionSettings>().unwrap().timeout_secs, 5);
        assert_eq!(reopened.get::<ValidationSettings>().unwrap().debounce_ms, 300);
    }

    #[test]
    fn rejects_bad_endpoint() {
        let dir = TempDir::new().unwrap();
        let store = build_settings_store(dir.path().join("s.ron")).unwrap();
        let err = store
            .update::<SubmissionSettings, _>(|s| s.endpoint = "ftp://x".into())
            .unwrap_err();
        assert!(matches!(err, SettingsError::Validation { section: "submission", .. }));
    }

    #[test]
    fn debounce_and_auto_save_durations() {
        let dir = TempDir::new().unwrap();
        let store = build_settings_store(dir.path().join("s.ron")).unwrap();
        assert_eq!(
            store.get::<ValidationSettings>().unwrap().debounce(),
            Duration::from_millis(300)
        );
        assert_eq!(
            store.get::<Preferences>().unwrap().auto_save_interval(),
            Some(Duration::from_secs(30))
        );

        store.update::<Preferences, _>(|p| p.auto_save = false).unwrap();
        assert_eq!(store.get::<Preferences>().unwrap().auto_save_interval(), None);

        let err = store
            .update::<Preferences, _>(|p| {
                p.auto_save = true;
                p.auto_save_interval_secs = 0;
            })
            .unwrap_err();
        assert!(matches!(err, SettingsError::Validation { section: "preferences", .. }));
    }
}
