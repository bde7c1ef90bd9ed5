// =============================================================================
// Somoco Backend - SMTP Delivery
// =============================================================================
// Each send opens a fresh transport: the preferred port is verified first, then
// the other of 587/465. Port 465 is implicit TLS, everything else STARTTLS.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{MailError, Mailer, OutgoingEmail, SentEmail};
use crate::config::SmtpConfig;

const SMTPS_PORT: u16 = 465;
const SUBMISSION_PORT: u16 = 587;
const TIMEOUT: Duration = Duration::from_secs(20);

type Transport = AsyncSmtpTransport<Tokio1Executor>;

/// Ports to try, in order.
pub(crate) fn port_order(preferred: u16) -> [u16; 2] {
    let fallback = if preferred == SUBMISSION_PORT {
        SMTPS_PORT
    } else {
        SUBMISSION_PORT
    };
    [preferred, fallback]
}

pub struct SmtpMailer {
    config: Option<SmtpConfig>,
}

impl SmtpMailer {
    pub fn new(config: Option<SmtpConfig>) -> Self {
        Self { config }
    }

    fn transport(config: &SmtpConfig, port: u16) -> Result<Transport, lettre::transport::smtp::Error> {
        let builder = if port == SMTPS_PORT {
            Transport::relay(&config.host)?
        } else {
            Transport::starttls_relay(&config.host)?
        };
        Ok(builder
            .port(port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .timeout(Some(TIMEOUT))
            .build())
    }

    /// First transport whose connection test passes.
    async fn verified_transport(config: &SmtpConfig) -> Result<Transport, MailError> {
        let mut failures = Vec::new();
        for port in port_order(config.port) {
            let outcome = match Self::transport(config, port) {
                Ok(transport) => match transport.test_connection().await {
                    Ok(true) => return Ok(transport),
                    Ok(false) => "connection test failed".to_string(),
                    Err(e) => e.to_string(),
                },
                Err(e) => e.to_string(),
            };
            tracing::warn!(port, error = %outcome, "SMTP verify failed");
            failures.push(format!("port {port}: {outcome}"));
        }
        Err(MailError::Verify(failures.join(" | ")))
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

fn build_message(from: &str, email: OutgoingEmail) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(mailbox(from)?)
        .to(mailbox(&email.to)?)
        .subject(email.subject)
        .header(ContentType::TEXT_HTML);
    if let Some(reply_to) = &email.reply_to {
        builder = builder.reply_to(mailbox(reply_to)?);
    }
    builder.body(email.html).map_err(|e| MailError::Smtp(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<SentEmail, MailError> {
        let config = self.config.as_ref().ok_or(MailError::NotConfigured("SMTP"))?;
        let message = build_message(&config.from, email)?;
        let transport = Self::verified_transport(config).await?;
        transport
            .send(message)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;
        Ok(SentEmail::default())
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(reply_to: Option<&str>) -> OutgoingEmail {
        OutgoingEmail {
            to: "cs@somotex.com".into(),
            reply_to: reply_to.map(str::to_string),
            subject: "New Contact Form Submission from Ada".into(),
            html: "<p>hello</p>".into(),
        }
    }

    #[test]
    fn test_port_order() {
        assert_eq!(port_order(587), [587, 465]);
        assert_eq!(port_order(465), [465, 587]);
        assert_eq!(port_order(2525), [2525, 587]);
    }

    #[test]
    fn test_build_message_sets_reply_to() {
        let message = build_message("noreply@somotex.com", email(Some("ada@example.com"))).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Reply-To: ada@example.com"));
        assert!(raw.contains("Content-Type: text/html"));
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let err = build_message("noreply@somotex.com", email(Some("not an address"))).unwrap_err();
        assert!(matches!(err, MailError::Address { .. }));
    }

    #[tokio::test]
    async fn test_unconfigured() {
        let mailer = SmtpMailer::new(None);
        assert!(!mailer.is_configured());
        assert!(matches!(
            mailer.send(email(None)).await,
            Err(MailError::NotConfigured("SMTP"))
        ));
    }
}
