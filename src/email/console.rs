//! Console mailer for development: logs the message instead of sending it.

use async_trait::async_trait;

use crate::error::Result;
use super::{Email, Mailer};

/// Development transport; message bodies land in the log, nothing leaves
/// the process.
#[derive(Debug, Clone, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        email.validate()?;
        tracing::info!(
            to = %email.to,
            from = %email.from,
            subject = %email.subject,
            body_bytes = email.text.len(),
            "email (console backend, not delivered)"
        );
        Ok(())
    }
}
