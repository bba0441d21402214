//! Hands a completed form to the backend.

mod payload;
mod transport;

use tracing::{info, warn};

pub use payload::SubmissionPayload;
pub use transport::{HttpTransport, SUBMIT_PATH, SubmitResponse, Transport};

use crate::errors::TransportError;
use crate::form::FormState;

const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Single-shot submission: one request, no retries, no partial success.
pub struct SubmissionPipeline<T: Transport> {
    transport: T,
}

impl<T: Transport> SubmissionPipeline<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// A reply with `success: false` becomes [`TransportError::Rejected`].
    pub async fn submit(&self, state: &FormState) -> Result<SubmitResponse, TransportError> {
        let payload = SubmissionPayload::from(state);
        info!(
            "submitting application for {} ({} ID proofs)",
            payload.full_name,
            payload.id_proofs.len()
        );

        let response = self.transport.send(&payload).await?;
        if !response.success {
            let reason = response.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            warn!("application rejected: {reason}");
            return Err(TransportError::Rejected(reason));
        }
        for warning in response.warnings() {
            warn!("submission accepted with warning: {warning}");
        }
        info!(
            "application submitted{}",
            response
                .application_id
                .as_deref()
                .map(|id| format!(" as {id}"))
                .unwrap_or_default()
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<SubmitResponse, fn() -> TransportError>,
        seen: Mutex<Vec<SubmissionPayload>>,
    }

    impl Transport for Scripted {
        async fn send(&self, payload: &SubmissionPayload) -> Result<SubmitResponse, TransportError> {
            self.seen.lock().unwrap().push(payload.clone());
            self.reply.clone().map_err(|make| make())
        }
    }

    fn pipeline(reply: Result<SubmitResponse, fn() -> TransportError>) -> SubmissionPipeline<Scripted> {
        SubmissionPipeline::new(Scripted {
            reply,
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn rejected_reply_carries_backend_error() {
        let p = pipeline(Ok(SubmitResponse {
            success: false,
            error: Some("Failed to submit to both Notion and Telegram".into()),
            ..SubmitResponse::default()
        }));
        let err = p.submit(&FormState::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to submit to both Notion and Telegram");
        assert_eq!(p.transport().seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_reply_without_reason() {
        let p = pipeline(Ok(SubmitResponse::default()));
        let err = p.submit(&FormState::new()).await.unwrap_err();
        assert_eq!(err.to_string(), UNKNOWN_ERROR);
    }

    #[tokio::test]
    async fn network_failure_is_not_retried() {
        let p = pipeline(Err(|| TransportError::Network("connection refused".into())));
        let err = p.submit(&FormState::new()).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
        assert_eq!(p.transport().seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn accepted_reply_is_returned() {
        let p = pipeline(Ok(SubmitResponse {
            success: true,
            application_id: Some("HA-20261016".into()),
            ..SubmitResponse::default()
        }));
        let response = p.submit(&FormState::new()).await.unwrap();
        assert_eq!(response.application_id.as_deref(), Some("HA-20261016"));
    }
}
