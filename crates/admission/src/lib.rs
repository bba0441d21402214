//! Intake core for the hostel admission form.
//!
//! - [`validation`]: rule table, named validators and debounced field checks.
//! - [`draft`]: sanitized, expiring draft snapshots and submission history on a
//!   pluggable key-value store.
//! - [`form`]: form state, step sequence and the controller tying it all together.
//! - [`submission`]: payload assembly and the HTTP transport.
//! - [`admin`]: listing helpers behind the admin dashboard.

pub mod admin;
pub mod clock;
pub mod config;
pub mod draft;
mod errors;
pub mod form;
pub mod submission;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use draft::{DraftStore, FileStore, KeyValueStore, MemoryStore};
pub use errors::{
    AdminError, FormError, NavigationError, StorageError, SubmitError, TransportError,
    ValidationError,
};
pub use form::{FormController, FormState, Step, is_step_completed};
pub use submission::{HttpTransport, SubmissionPipeline, Transport};
pub use validation::{ValidationDebouncer, ValidationRule, Validator};
