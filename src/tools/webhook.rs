//! Customer handoff delivery.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::BackendError;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(15);

/// Contact details collected for a human follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandoffRequest {
    /// Customer name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Email address.
    pub email: String,
    /// Product of interest.
    pub product: String,
    /// Customer location.
    pub location: String,
}

/// Destination for handoff requests.
#[async_trait]
pub trait HandoffSink: Send + Sync {
    /// Delivers one request.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if delivery fails.
    async fn submit(&self, request: &HandoffRequest) -> Result<(), BackendError>;
}

/// Posts handoff requests as JSON to a webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    event: &'static str,
    customer: &'a HandoffRequest,
}

impl WebhookSink {
    /// Creates a sink posting to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Request`] if the HTTP client cannot be built.
    pub fn new(url: &str) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl HandoffSink for WebhookSink {
    async fn submit(&self, request: &HandoffRequest) -> Result<(), BackendError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                event: "customer_handoff",
                customer: request,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::UnexpectedStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        debug!(status = status.as_u16(), "handoff webhook accepted");
        Ok(())
    }
}
