use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Validator;
use crate::config::ValidationSettings;
use crate::errors::ValidationError;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Outcome of a deferred field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    pub field: String,
    pub value: String,
    pub result: Result<(), ValidationError>,
}

/// Per-field delayed validation for keystroke input.
///
/// Each field has at most one pending check; scheduling again restarts its
/// delay. Reports arrive on the receiver returned by [`ValidationDebouncer::new`].
/// Must be used from within a tokio runtime.
pub struct ValidationDebouncer {
    validator: Arc<Validator>,
    delay: Duration,
    pending: HashMap<String, JoinHandle<()>>,
    reports: mpsc::UnboundedSender<FieldReport>,
}

impl ValidationDebouncer {
    pub fn new(
        validator: Arc<Validator>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<FieldReport>) {
        let (reports, rx) = mpsc::unbounded_channel();
        (
            Self {
                validator,
                delay,
                pending: HashMap::new(),
                reports,
            },
            rx,
        )
    }

    pub fn from_settings(
        validator: Arc<Validator>,
        settings: &ValidationSettings,
    ) -> (Self, mpsc::UnboundedReceiver<FieldReport>) {
        Self::new(validator, settings.debounce())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Input event. Blank input cancels the pending check and is not validated.
    pub fn schedule(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        self.cancel(field);
        self.pending.retain(|_, handle| !handle.is_finished());
        if value.trim().is_empty() {
            return;
        }

        let validator = Arc::clone(&self.validator);
        let reports = self.reports.clone();
        let delay = self.delay;
        let name = field.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let result = validator.validate_field(&name, &value);
            // receiver gone means nobody is listening anymore
            let _ = reports.send(FieldReport {
                field: name,
                value,
                result,
            });
        });
        self.pending.insert(field.to_string(), handle);
    }

    /// Blur event: drop any pending check and validate right away.
    pub fn validate_now(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        self.cancel(field);
        self.validator.validate_field(field, value)
    }

    /// Abort the pending check for `field`. Returns whether one was still waiting.
    pub fn cancel(&mut self, field: &str) -> bool {
        match self.pending.remove(field) {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }

    /// Number of checks still waiting for their delay to elapse.
    pub fn pending(&self) -> usize {
        self.pending.values().filter(|h| !h.is_finished()).count()
    }

    /// Handles held, finished ones included until the next [`ValidationDebouncer::schedule`].
    pub fn tracked(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for ValidationDebouncer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::fields::{EMAIL, FULL_NAME, PHONE};
    use crate::validation::messages;

    fn debouncer() -> (ValidationDebouncer, mpsc::UnboundedReceiver<FieldReport>) {
        ValidationDebouncer::new(Arc::new(Validator::default()), DEFAULT_DEBOUNCE)
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_keystroke_is_validated() {
        let (mut debouncer, mut rx) = debouncer();
        debouncer.schedule(EMAIL, "a@");
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(EMAIL, "a@b.co");
        assert_eq!(debouncer.pending(), 1);

        tokio::time::sleep(Duration::from_millis(350)).await;
        let report = rx.recv().await.expect("report");
        assert_eq!(report.value, "a@b.co");
        assert_eq!(report.result, Ok(()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_before_the_delay() {
        let (mut debouncer, mut rx) = debouncer();
        debouncer.schedule(EMAIL, "not-an-email");
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let report = rx.recv().await.expect("report");
        assert_eq!(report.result.unwrap_err().message, messages::EMAIL);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_is_not_validated() {
        let (mut debouncer, mut rx) = debouncer();
        debouncer.schedule(EMAIL, "x");
        debouncer.schedule(EMAIL, "  ");
        assert_eq!(debouncer.pending(), 0);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn delay_comes_from_settings() {
        let settings = ValidationSettings { debounce_ms: 50 };
        let (mut debouncer, mut rx) =
            ValidationDebouncer::from_settings(Arc::new(Validator::default()), &settings);
        assert_eq!(debouncer.delay(), Duration::from_millis(50));

        debouncer.schedule(EMAIL, "a@b.co");
        tokio::time::sleep(Duration::from_millis(51)).await;
        assert_eq!(rx.recv().await.expect("report").result, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_checks_are_forgotten() {
        let (mut debouncer, mut rx) = debouncer();
        debouncer.schedule(EMAIL, "a@b.co");
        debouncer.schedule(FULL_NAME, "Asha Rao");
        assert_eq!(debouncer.tracked(), 2);

        tokio::time::sleep(Duration::from_millis(350)).await;
        rx.recv().await.expect("first report");
        rx.recv().await.expect("second report");
        assert_eq!(debouncer.pending(), 0);

        debouncer.schedule(PHONE, "5551234567");
        assert_eq!(debouncer.tracked(), 1);
        assert_eq!(debouncer.pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn blur_validates_immediately_and_cancels() {
        let (mut debouncer, mut rx) = debouncer();
        debouncer.schedule(EMAIL, "a@b");
        let result = debouncer.validate_now(EMAIL, "a@b");
        assert_eq!(result.unwrap_err().message, messages::EMAIL);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
