//! Commerce backend: order status and return initiation.
//!
//! [`InMemoryCommerce`] serves a fixed set of demo orders and is the default
//! when no backend URL is configured. [`HttpCommerce`] talks to a REST
//! service exposing `GET /orders/{id}/status` and `POST /returns/initiate`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::BackendError;

/// Request timeout for backend calls. The agent deadline still applies on
/// top of this.
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest response body kept in error messages.
const MAX_ERROR_BODY: usize = 200;

/// Status of one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    /// Order identifier.
    #[serde(alias = "id")]
    pub order_id: String,
    /// Fulfilment status, e.g. `Shipped`.
    pub status: String,
    /// Ordered product id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Ordered product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// Shipping carrier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    /// Carrier tracking number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    /// Estimated delivery date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
    /// Actual delivery date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
}

impl OrderStatus {
    /// Renders the order as `Label: value` lines.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = format!("Order ID: {}\nStatus: {}", self.order_id, self.status);
        let optional = [
            ("Product ID", &self.product_id),
            ("Product Name", &self.product_name),
            ("Carrier", &self.carrier),
            ("Tracking Number", &self.tracking_number),
            ("Estimated Delivery", &self.estimated_delivery),
            ("Delivery Date", &self.delivery_date),
        ];
        for (label, value) in optional {
            if let Some(value) = value {
                let _ = write!(out, "\n{label}: {value}");
            }
        }
        out
    }
}

/// Confirmation of an initiated return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnConfirmation {
    /// Order being returned.
    pub order_id: String,
    /// Return reference, when the backend issued one.
    pub return_id: Option<String>,
    /// Backend message.
    pub message: String,
}

/// Order and returns backend.
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Looks up an order; `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the backend cannot be reached or
    /// answers unexpectedly.
    async fn order_status(&self, order_id: &str) -> Result<Option<OrderStatus>, BackendError>;

    /// Starts a return; `None` when the order does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the backend cannot be reached or
    /// answers unexpectedly.
    async fn initiate_return(
        &self,
        order_id: &str,
        reason: Option<&str>,
    ) -> Result<Option<ReturnConfirmation>, BackendError>;
}

/// Demo backend seeded with a handful of orders.
#[derive(Debug)]
pub struct InMemoryCommerce {
    orders: HashMap<String, OrderStatus>,
    returns: Mutex<Vec<ReturnConfirmation>>,
}

impl Default for InMemoryCommerce {
    fn default() -> Self {
        Self::with_orders(demo_orders())
    }
}

impl InMemoryCommerce {
    /// Creates a backend serving `orders`.
    #[must_use]
    pub fn with_orders(orders: Vec<OrderStatus>) -> Self {
        Self {
            orders: orders
                .into_iter()
                .map(|o| (o.order_id.clone(), o))
                .collect(),
            returns: Mutex::new(Vec::new()),
        }
    }

    /// Returns initiated so far.
    #[must_use]
    pub fn returns(&self) -> Vec<ReturnConfirmation> {
        self.returns.lock().clone()
    }
}

#[async_trait]
impl CommerceBackend for InMemoryCommerce {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn order_status(&self, order_id: &str) -> Result<Option<OrderStatus>, BackendError> {
        Ok(self.orders.get(order_id).cloned())
    }

    async fn initiate_return(
        &self,
        order_id: &str,
        reason: Option<&str>,
    ) -> Result<Option<ReturnConfirmation>, BackendError> {
        if !self.orders.contains_key(order_id) {
            return Ok(None);
        }
        let return_id = format!(
            "RET-{}",
            &Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        );
        let confirmation = ReturnConfirmation {
            order_id: order_id.to_string(),
            return_id: Some(return_id.clone()),
            message: format!(
                "Return for order '{order_id}' has been initiated successfully. Return ID: {return_id}"
            ),
        };
        debug!(order_id, return_id = %return_id, reason, "return recorded");
        self.returns.lock().push(confirmation.clone());
        Ok(Some(confirmation))
    }
}

/// Seed orders for the in-memory backend.
#[must_use]
pub fn demo_orders() -> Vec<OrderStatus> {
    vec![
        OrderStatus {
            order_id: "ORD-87654".to_string(),
            status: "Shipped".to_string(),
            product_id: Some("PROD-203".to_string()),
            product_name: Some("Modern Leather Armchair".to_string()),
            carrier: Some("FedEx".to_string()),
            tracking_number: Some("1Z9999999999999999".to_string()),
            estimated_delivery: Some("2024-09-20".to_string()),
            delivery_date: None,
        },
        OrderStatus {
            order_id: "ORD-12345".to_string(),
            status: "Delivered".to_string(),
            product_id: Some("PROD-101".to_string()),
            product_name: Some("Bohemian Jute & Wool Area Rug".to_string()),
            carrier: None,
            tracking_number: None,
            estimated_delivery: None,
            delivery_date: Some("2024-09-01".to_string()),
        },
        OrderStatus {
            order_id: "ORD-99887".to_string(),
            status: "Processing".to_string(),
            product_id: Some("PROD-405".to_string()),
            product_name: Some("Vintage Industrial Bookshelf".to_string()),
            carrier: None,
            tracking_number: None,
            estimated_delivery: Some("2024-09-25".to_string()),
            delivery_date: None,
        },
    ]
}

/// REST commerce backend.
#[derive(Debug, Clone)]
pub struct HttpCommerce {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct InitiateReturnBody<'a> {
    order_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Deserialize)]
struct InitiateReturnResponse {
    message: String,
    #[serde(default)]
    return_id: Option<String>,
}

impl HttpCommerce {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Request`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CommerceBackend for HttpCommerce {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn order_status(&self, order_id: &str) -> Result<Option<OrderStatus>, BackendError> {
        let url = format!("{}/orders/{order_id}/status", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(unexpected(response).await);
        }
        let mut order: OrderStatus = response.json().await?;
        if order.order_id.is_empty() {
            order.order_id = order_id.to_string();
        }
        Ok(Some(order))
    }

    async fn initiate_return(
        &self,
        order_id: &str,
        reason: Option<&str>,
    ) -> Result<Option<ReturnConfirmation>, BackendError> {
        let url = format!("{}/returns/initiate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&InitiateReturnBody { order_id, reason })
            .send()
            .await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(unexpected(response).await);
        }
        let body: InitiateReturnResponse = response.json().await?;
        let return_id = body
            .return_id
            .or_else(|| extract_return_id(&body.message));
        Ok(Some(ReturnConfirmation {
            order_id: order_id.to_string(),
            return_id,
            message: body.message,
        }))
    }
}

async fn unexpected(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    BackendError::UnexpectedStatus { status, body }
}

/// Pulls the id out of `"... Return ID: <id>"`.
fn extract_return_id(message: &str) -> Option<String> {
    let (_, rest) = message.split_once("Return ID:")?;
    let id = rest.trim().trim_end_matches('.').trim();
    (!id.is_empty()).then(|| id.to_string())
}
