//! Typed, sectioned settings backed by a single RON delta file.
//!
//! Each section is a serde struct implementing [`Settings`]. Defaults come
//! from `Default`; the file on disk only holds values that differ from them.

mod errors;
mod store;

pub use errors::SettingsError;
pub use store::{SettingsStore, SettingsStoreBuilder};

/// A strongly typed settings section.
pub trait Settings: Send + Sync + 'static {
    /// Name of the top-level key in the settings file.
    const SECTION: &'static str;

    fn name() -> &'static str {
        Self::SECTION
    }

    /// Reject values that deserialize fine but make no sense (zero limits, empty urls, ...).
    fn validate(&self) -> Result<(), SettingsError> {
        Ok(())
    }
}
