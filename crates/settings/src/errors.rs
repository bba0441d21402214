use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),

    #[error("invalid settings: {0}")]
    Invalid(&'static str),

    #[error("section not registered")]
    NotRegistered,

    #[error("section `{section}` rejected: {reason}")]
    Validation {
        section: &'static str,
        reason: String,
    },

    #[error("settings lock poisoned")]
    Poisoned,
}
