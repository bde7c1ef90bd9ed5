//! Outgoing email
//!
//! ## Table of Contents
//! - **Mailer**: async trait the handlers send through
//! - **SmtpMailer**: contact form and password reset mail over SMTP
//! - **ResendMailer**: partner inquiries over the Resend HTTP API
//! - **MemoryMailer**: records messages instead of sending them
//! - **templates**: HTML bodies for every message the site sends
//!
//! No queueing and no retries, apart from the SMTP port fallback.

mod resend;
mod smtp;
pub mod templates;

pub use resend::ResendMailer;
pub use smtp::SmtpMailer;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Errors from an email provider.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("SMTP verify failed on all ports ({0})")]
    Verify(String),

    #[error("SMTP send failed: {0}")]
    Smtp(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider responded {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// One message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

/// Provider receipt. `id` is only known for HTTP providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentEmail {
    pub id: Option<String>,
}

/// Trait for email delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<SentEmail, MailError>;

    /// Whether the provider has the credentials it needs to send at all.
    fn is_configured(&self) -> bool {
        true
    }

    /// Provider name for logging
    fn name(&self) -> &str;
}

// -----------------------------------------------------------------------------
// Memory Mailer
// -----------------------------------------------------------------------------

/// Messages a `MemoryMailer` keeps before dropping the oldest.
pub const MEMORY_MAILER_CAPACITY: usize = 256;

/// Keeps the most recent messages in memory. Can be switched to fail every
/// send.
#[derive(Debug)]
pub struct MemoryMailer {
    sent: Mutex<VecDeque<OutgoingEmail>>,
    delivered: AtomicUsize,
    capacity: usize,
    failing: AtomicBool,
}

impl Default for MemoryMailer {
    fn default() -> Self {
        Self::with_capacity(MEMORY_MAILER_CAPACITY)
    }
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sent: Mutex::new(VecDeque::new()),
            delivered: AtomicUsize::new(0),
            capacity: capacity.max(1),
            failing: AtomicBool::new(false),
        }
    }

    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Retained messages, oldest first.
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.iter().cloned().collect()
    }

    /// Take the retained messages, leaving the mailer empty.
    pub async fn drain(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.drain(..).collect()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<SentEmail, MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Rejected(format!("refusing to deliver to {}", email.to)));
        }
        tracing::info!(to = %email.to, subject = %email.subject, "email recorded");
        let mut sent = self.sent.lock().await;
        if sent.len() == self.capacity {
            sent.pop_front();
        }
        sent.push_back(email);
        let seq = self.delivered.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SentEmail {
            id: Some(format!("memory-{seq}")),
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
