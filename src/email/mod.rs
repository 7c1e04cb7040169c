//! Outbound email.
//!
//! The [`Mailer`] trait abstracts the transport; notifications themselves
//! go through [`Notifier`], which is fire-and-forget: a failed send is
//! logged and never blocks the request that triggered it.

pub mod console;
pub mod notify;
pub mod smtp;

pub use console::ConsoleMailer;
pub use notify::Notifier;
pub use smtp::{SmtpConfig, SmtpMailer};

use async_trait::async_trait;

use crate::error::{EncoreError, Result};

/// An email message to be sent.
#[derive(Debug, Clone)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl Email {
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(EncoreError::validation("email 'from' is required"));
        }
        if self.to.is_empty() {
            return Err(EncoreError::validation("email 'to' is required"));
        }
        if self.subject.is_empty() {
            return Err(EncoreError::validation("email 'subject' is required"));
        }
        Ok(())
    }
}

/// Email transport backend.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;
}
