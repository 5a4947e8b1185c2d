use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::CheckoutSessionResponse;

/// PaymentError
///
/// Failures surfaced by the payment collaborator. Kept coarse on purpose: the
/// handlers map every variant to a 502, and the details land in the logs.
#[derive(Debug)]
pub enum PaymentError {
    /// The processor could not be reached or returned a transport-level failure.
    Unavailable(String),
    /// The processor answered, but with something we could not accept.
    Rejected(String),
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentError::Unavailable(msg) => write!(f, "payment provider unavailable: {}", msg),
            PaymentError::Rejected(msg) => write!(f, "payment provider rejected request: {}", msg),
        }
    }
}

impl std::error::Error for PaymentError {}

/// PaymentService
///
/// Abstracts the external payment processor behind a trait so handlers depend on
/// the capability, not the HTTP client. Mirrors the repository abstraction: the
/// production implementation talks to the hosted API, tests swap in a mock.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Opens a hosted checkout session for the premium upgrade and returns the
    /// URL the client should redirect the browser to.
    async fn create_checkout_session(
        &self,
        user_id: Uuid,
    ) -> Result<CheckoutSessionResponse, PaymentError>;

    /// Asks the processor whether the given session was actually paid.
    /// Returns Ok(true) only on a confirmed payment.
    async fn verify_session(&self, session_id: &str) -> Result<bool, PaymentError>;
}

/// PaymentState
///
/// The concrete type used to share the payment collaborator across the application state.
pub type PaymentState = Arc<dyn PaymentService>;

#[derive(Deserialize)]
struct SessionCreated {
    id: String,
    url: String,
}

#[derive(Deserialize)]
struct SessionStatus {
    payment_status: String,
}

/// HttpPaymentClient
///
/// Production implementation backed by the hosted checkout API (reqwest).
/// Authentication uses the secret key as a Bearer token, per the processor's docs.
pub struct HttpPaymentClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    site_url: String,
}

impl HttpPaymentClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.payment_api_url.clone(),
            api_key: config.payment_api_key.clone(),
            site_url: config.site_url.clone(),
        }
    }
}

#[async_trait]
impl PaymentService for HttpPaymentClient {
    /// create_checkout_session
    ///
    /// Creates the hosted session. The user's UUID travels in the session metadata
    /// so the success page can later tie the payment back to the account.
    async fn create_checkout_session(
        &self,
        user_id: Uuid,
    ) -> Result<CheckoutSessionResponse, PaymentError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "mode": "payment",
                "client_reference_id": user_id,
                "success_url": format!("{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}", self.site_url),
                "cancel_url": format!("{}/premium", self.site_url),
            }))
            .send()
            .await
            .map_err(|e| PaymentError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("checkout session creation failed: {} {}", status, body);
            return Err(PaymentError::Rejected(format!("status {}", status)));
        }

        let session: SessionCreated = response
            .json()
            .await
            .map_err(|e| PaymentError::Rejected(e.to_string()))?;

        Ok(CheckoutSessionResponse {
            session_id: session.id,
            url: session.url,
        })
    }

    /// verify_session
    ///
    /// Retrieves the session from the processor and checks its payment status.
    /// The premium flag is only ever flipped on the strength of this answer,
    /// never on the client's say-so.
    async fn verify_session(&self, session_id: &str) -> Result<bool, PaymentError> {
        let response = self
            .client
            .get(format!("{}/v1/checkout/sessions/{}", self.api_url, session_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| PaymentError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Rejected(format!(
                "status {}",
                response.status()
            )));
        }

        let status: SessionStatus = response
            .json()
            .await
            .map_err(|e| PaymentError::Rejected(e.to_string()))?;

        Ok(status.payment_status == "paid")
    }
}

/// MockPaymentService
///
/// In-memory stand-in used by the test suites. Behaviour is driven by two flags
/// so tests can exercise the failure paths without a live processor.
pub struct MockPaymentService {
    pub should_fail: bool,
    pub session_paid: bool,
}

impl MockPaymentService {
    pub fn new() -> Self {
        Self {
            should_fail: false,
            session_paid: true,
        }
    }
}

impl Default for MockPaymentService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentService for MockPaymentService {
    async fn create_checkout_session(
        &self,
        user_id: Uuid,
    ) -> Result<CheckoutSessionResponse, PaymentError> {
        if self.should_fail {
            return Err(PaymentError::Unavailable("mock outage".to_string()));
        }
        Ok(CheckoutSessionResponse {
            session_id: format!("cs_test_{}", user_id.simple()),
            url: format!("https://checkout.test/session/{}", user_id.simple()),
        })
    }

    async fn verify_session(&self, session_id: &str) -> Result<bool, PaymentError> {
        if self.should_fail {
            return Err(PaymentError::Unavailable("mock outage".to_string()));
        }
        if session_id.is_empty() {
            return Err(PaymentError::Rejected("empty session id".to_string()));
        }
        Ok(self.session_paid)
    }
}
