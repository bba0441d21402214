use serde::Serialize;
use thiserror::Error;

use crate::form::Step;

/// A single field- or form-level rule violation. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Mutation rejected at the form-state boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Maximum {max} ID proof documents allowed")]
    TooManyIdProofs { max: usize },

    #[error("no ID proof at position {0}")]
    NoSuchIdProof(usize),
}

/// Failure of the key-value substrate. Absorbed by the draft store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage quota exceeded: need {needed} bytes, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    pub fn is_quota(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

/// Submission transport failure; the only error that crosses the pipeline boundary.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{0}")]
    Network(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// Step navigation refused; the controller stays where it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("{}", blocked_message(.errors))]
    Blocked {
        step: Step,
        errors: Vec<ValidationError>,
    },

    #[error("already on the first step")]
    AtFirstStep,

    #[error("already on the last step")]
    AtLastStep,

    #[error("step {0} does not exist")]
    OutOfRange(u8),

    #[error("step {} is not completed yet", .0.number())]
    NotReachable(Step),
}

fn blocked_message(errors: &[ValidationError]) -> &str {
    errors
        .first()
        .map(|e| e.message.as_str())
        .unwrap_or("This step is incomplete")
}

impl NavigationError {
    /// First blocking message, if the refusal came from validation.
    pub fn first_error(&self) -> Option<&ValidationError> {
        match self {
            NavigationError::Blocked { errors, .. } => errors.first(),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Please complete all required fields")]
    Incomplete(Vec<Step>),

    #[error("submission is only possible from the review step")]
    NotOnReview,

    #[error("Failed to submit application: {0}")]
    Transport(#[from] TransportError),
}

/// Bad input to the admin listing helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("Application IDs and status are required")]
    NothingSelected,

    #[error("unknown status {0:?}")]
    UnknownStatus(String),

    #[error("unknown sort field {0:?}")]
    UnknownSortField(String),

    #[error("unknown export format {0:?}")]
    UnknownFormat(String),
}
