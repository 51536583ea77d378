//! Outbound email delivery.
//!
//! The core depends only on the `Mailer` capability; `EmailClient` is the
//! production implementation, posting to an HTTP email API. Delivery runs
//! under the client's request timeout and failures surface as
//! `EmailError::DeliveryFailed` rather than being swallowed.

use serde::Serialize;

use crate::error::EmailError;
use crate::validators::is_valid_email;

/// Send capability consumed by the OTP and password-reset protocols.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError>;
}

/// A validated sender address.
#[derive(Clone)]
pub struct SenderAddress(String);

impl SenderAddress {
    pub fn parse(s: String) -> Result<Self, String> {
        let email = is_valid_email(&s).map_err(|e| e.to_string())?;
        Ok(Self(email))
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Html")]
    html: String,
}

#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: SenderAddress,
}

impl EmailClient {
    /// The `http_client` should be built with a bounded timeout; delivery
    /// must never hang a request indefinitely.
    pub fn new(base_url: String, sender: SenderAddress, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
            sender,
        }
    }
}

#[async_trait::async_trait]
impl Mailer for EmailClient {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: self.sender.inner().to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            html: html_body.to_string(),
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send email: {}", e);
                EmailError::DeliveryFailed(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Email service returned error: {}", e);
                EmailError::DeliveryFailed(e.to_string())
            })?;

        Ok(())
    }
}
