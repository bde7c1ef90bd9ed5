// =============================================================================
// Somoco Backend - Resend Delivery
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{MailError, Mailer, OutgoingEmail, SentEmail};
use crate::config::ResendConfig;

const API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

pub struct ResendMailer {
    http: Client,
    config: Option<ResendConfig>,
}

impl ResendMailer {
    pub fn new(config: Option<ResendConfig>) -> Result<Self, MailError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<SentEmail, MailError> {
        let config = self.config.as_ref().ok_or(MailError::NotConfigured("Resend"))?;
        let body = SendRequest {
            from: &config.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
        };

        let response = self
            .http
            .post(API_URL)
            .bearer_auth(&config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(MailError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendResponse = response.json().await?;
        tracing::info!(id = %sent.id, to = %email.to, "email accepted by Resend");
        Ok(SentEmail { id: Some(sent.id) })
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn name(&self) -> &str {
        "resend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = SendRequest {
            from: "Somoco EV <onboarding@resend.dev>",
            to: ["partner@bank.example"],
            subject: "New Finance Inquiry",
            html: "<p>hi</p>",
            reply_to: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["to"], serde_json::json!(["partner@bank.example"]));
        assert!(value.get("reply_to").is_none());
    }
}
