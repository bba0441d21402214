use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::{FormState, ReviewRenderer, ReviewSummary, Step, is_step_completed};
use crate::draft::{DraftStore, KeyValueStore, SubmissionOutcome};
use crate::errors::{NavigationError, SubmitError};
use crate::submission::{SubmissionPipeline, SubmitResponse, Transport};
use crate::validation::Validator;

/// Single owner of the in-progress form and its position in the step sequence.
pub struct FormController<S: KeyValueStore> {
    state: FormState,
    step: Step,
    validator: Arc<Validator>,
    drafts: DraftStore<S>,
    renderer: Option<Box<dyn ReviewRenderer>>,
    auto_save: Option<Duration>,
    last_saved: Option<DateTime<Utc>>,
}

impl<S: KeyValueStore> FormController<S> {
    pub fn new(validator: Arc<Validator>, drafts: DraftStore<S>) -> Self {
        Self {
            state: FormState::new(),
            step: Step::FIRST,
            validator,
            drafts,
            renderer: None,
            auto_save: None,
            last_saved: None,
        }
    }

    /// Save the draft whenever the step changes, at most once per `interval`.
    pub fn with_auto_save(mut self, interval: Option<std::time::Duration>) -> Self {
        self.auto_save = interval.map(|i| Duration::from_std(i).unwrap_or(Duration::MAX));
        self
    }

    pub fn with_renderer(mut self, renderer: impl ReviewRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn with_state(mut self, state: FormState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut FormState {
        &mut self.state
    }

    pub fn set_value(&mut self, field: &str, value: impl Into<String>) {
        self.state.set_value(field, value);
    }

    pub fn current_step(&self) -> Step {
        self.step
    }

    pub fn validator(&self) -> &Arc<Validator> {
        &self.validator
    }

    pub fn drafts(&self) -> &DraftStore<S> {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut DraftStore<S> {
        &mut self.drafts
    }

    pub fn is_step_completed(&self, step: Step) -> bool {
        is_step_completed(step, &self.state)
    }

    /// Position in the sequence as a percentage (step 1 of 7 is 14).
    pub fn progress(&self) -> u8 {
        let total = Step::ALL.len() as f64;
        ((f64::from(self.step.number()) / total) * 100.0).round() as u8
    }

    fn land(&mut self, step: Step) -> Step {
        debug!("step {} -> {}", self.step.number(), step.number());
        self.step = step;
        self.auto_save();
        if step == Step::Review {
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.render(&ReviewSummary::from_state(&self.state));
            }
        }
        step
    }

    /// Advance when the current step validates; otherwise stay and report why.
    pub fn next(&mut self) -> Result<Step, NavigationError> {
        let errors = self.validator.validate_step(self.step, &self.state);
        if !errors.is_empty() {
            return Err(NavigationError::Blocked {
                step: self.step,
                errors,
            });
        }
        let next = self.step.next().ok_or(NavigationError::AtLastStep)?;
        Ok(self.land(next))
    }

    pub fn prev(&mut self) -> Result<Step, NavigationError> {
        let prev = self.step.prev().ok_or(NavigationError::AtFirstStep)?;
        Ok(self.land(prev))
    }

    /// Jump backwards freely, forwards only onto a step that is already completed.
    pub fn go_to(&mut self, number: u8) -> Result<Step, NavigationError> {
        let target = Step::from_number(number).ok_or(NavigationError::OutOfRange(number))?;
        if target <= self.step || self.is_step_completed(target) {
            Ok(self.land(target))
        } else {
            Err(NavigationError::NotReachable(target))
        }
    }

    /// Steps before review that still miss required data.
    pub fn readiness(&self) -> Vec<Step> {
        Step::ALL
            .into_iter()
            .filter(|step| *step != Step::Review && !self.is_step_completed(*step))
            .collect()
    }

    pub fn review_summary(&self) -> ReviewSummary {
        ReviewSummary::from_state(&self.state)
    }

    pub fn save_draft(&mut self) -> bool {
        let saved = self.drafts.save_draft(&self.state);
        if saved {
            self.last_saved = Some(self.drafts.clock().now());
        }
        saved
    }

    fn auto_save(&mut self) {
        let Some(interval) = self.auto_save else {
            return;
        };
        let now = self.drafts.clock().now();
        if self.last_saved.is_some_and(|at| now - at < interval) {
            return;
        }
        if self.save_draft() {
            debug!("draft auto-saved");
        }
    }

    /// Overlay a stored draft onto the current state. Returns whether one was found.
    pub fn restore_draft(&mut self) -> bool {
        match self.drafts.load_draft() {
            Some(draft) => {
                self.state.merge_from(draft);
                info!("draft restored");
                true
            }
            None => false,
        }
    }

    pub fn clear_draft(&mut self) -> bool {
        self.drafts.clear_draft()
    }

    /// Submit from the review step.
    ///
    /// Every attempt is recorded in history. Success clears the stored draft;
    /// failure leaves it and the step untouched.
    pub async fn submit<T: Transport>(
        &mut self,
        pipeline: &SubmissionPipeline<T>,
    ) -> Result<SubmitResponse, SubmitError> {
        if self.step != Step::Review {
            return Err(SubmitError::NotOnReview);
        }
        let incomplete = self.readiness();
        if !incomplete.is_empty() {
            return Err(SubmitError::Incomplete(incomplete));
        }

        match pipeline.submit(&self.state).await {
            Ok(response) => {
                self.drafts.clear_draft();
                self.drafts.save_to_history(
                    &self.state,
                    SubmissionOutcome::succeeded(response.application_id.clone()),
                );
                Ok(response)
            }
            Err(err) => {
                warn!("submission failed: {err}");
                self.drafts
                    .save_to_history(&self.state, SubmissionOutcome::failed(err.to_string()));
                Err(SubmitError::Transport(err))
            }
        }
    }
}
