use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SubmissionPayload;
use crate::config::SubmissionSettings;
use crate::errors::TransportError;

pub const SUBMIT_PATH: &str = "/submit-application";
const FALLBACK_ERROR: &str = "Failed to submit application";

/// Backend reply to a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_warning: Option<String>,
}

impl SubmitResponse {
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        [&self.notion_warning, &self.telegram_warning]
            .into_iter()
            .filter_map(|w| w.as_deref())
    }
}

/// Delivers one payload and reports what the backend answered.
///
/// Implementations do not retry.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<SubmitResponse, TransportError>> + Send;
}

/// JSON over HTTP to the intake backend.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}{SUBMIT_PATH}", endpoint.trim_end_matches('/')),
        })
    }

    pub fn from_settings(settings: &SubmissionSettings) -> Result<Self, TransportError> {
        Self::new(&settings.endpoint, Duration::from_secs(settings.timeout_secs))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    async fn send(&self, payload: &SubmissionPayload) -> Result<SubmitResponse, TransportError> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| FALLBACK_ERROR.to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<SubmitResponse>().await?)
    }
}
