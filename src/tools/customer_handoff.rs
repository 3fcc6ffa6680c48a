//! Handing a customer over to the sales team.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use super::webhook::{HandoffRequest, HandoffSink};
use super::{Tool, ToolOutcome};

#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[allow(clippy::expect_used)]
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()\-.]{7,20}$").expect("phone pattern is valid"));

/// Input for [`CustomerHandoffTool`].
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CustomerHandoffInput {
    /// Customer's full name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Contact email address.
    pub email: String,
    /// Product the customer is interested in.
    pub product: String,
    /// Customer's city or region.
    pub location: String,
}

/// Passes collected contact details to a human follow-up channel.
#[derive(Clone)]
pub struct CustomerHandoffTool {
    sink: Option<Arc<dyn HandoffSink>>,
}

impl CustomerHandoffTool {
    /// Creates the tool; with no sink every request is politely declined.
    #[must_use]
    pub fn new(sink: Option<Arc<dyn HandoffSink>>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Tool for CustomerHandoffTool {
    const NAME: &'static str = "customer_handoff";
    type Input = CustomerHandoffInput;

    fn description(&self) -> &'static str {
        "Send the customer's contact details to the sales team so a person can follow up. \
         Only use this once the customer has provided their name, phone, email, the \
         product they are interested in and their location."
    }

    fn validate(&self, input: &Self::Input) -> Result<(), String> {
        let fields = [
            ("name", &input.name),
            ("phone", &input.phone),
            ("email", &input.email),
            ("product", &input.product),
            ("location", &input.location),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(format!("{field} must not be empty"));
        }
        if !EMAIL_RE.is_match(input.email.trim()) {
            return Err(format!("'{}' is not a valid email address", input.email.trim()));
        }
        if !PHONE_RE.is_match(input.phone.trim()) {
            return Err(format!("'{}' is not a valid phone number", input.phone.trim()));
        }
        Ok(())
    }

    async fn invoke(&self, input: Self::Input) -> ToolOutcome {
        let Some(sink) = &self.sink else {
            return ToolOutcome::BusinessFailure(
                "Customer handoff is not configured, so the details could not be passed to \
                 the sales team."
                    .to_string(),
            );
        };

        let request = HandoffRequest {
            name: input.name.trim().to_string(),
            phone: input.phone.trim().to_string(),
            email: input.email.trim().to_string(),
            product: input.product.trim().to_string(),
            location: input.location.trim().to_string(),
        };

        match sink.submit(&request).await {
            Ok(()) => {
                info!(product = %request.product, "customer handoff submitted");
                ToolOutcome::Success(format!(
                    "Thank you, {}. Your details have been passed to our sales team, who will \
                     contact you at {} about the {}.",
                    request.name, request.email, request.product
                ))
            }
            Err(e) => {
                warn!(error = %e, "customer handoff failed");
                ToolOutcome::BusinessFailure(
                    "The details could not be sent to the sales team right now. Please try \
                     again later."
                        .to_string(),
                )
            }
        }
    }
}
