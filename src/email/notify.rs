//! Fire-and-forget notifications.
//!
//! Sends happen on a spawned task: the triggering request never waits for
//! (or fails because of) the mail transport.

use std::sync::Arc;

use crate::config::EmailConfig;
use crate::contacts::Contact;
use crate::content::blog::BlogPost;
use super::{Email, Mailer};

/// Sends operational notifications without blocking the caller.
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    from_address: String,
    admin_address: String,
}

impl Notifier {
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>, config: &EmailConfig) -> Self {
        Self {
            mailer,
            from_address: config.from_address.clone(),
            admin_address: config.admin_address.clone(),
        }
    }

    fn dispatch(&self, email: Email) {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            if let Err(err) = mailer.send(&email).await {
                tracing::warn!(
                    to = %email.to,
                    subject = %email.subject,
                    error = %err,
                    "notification email failed"
                );
            }
        });
    }

    /// Notify the site operator about a new contact inquiry.
    pub fn contact_received(&self, contact: &Contact) {
        let email = Email::new(
            &self.from_address,
            &self.admin_address,
            format!("New inquiry: {}", contact.subject),
            format!(
                "From: {} <{}>\nCategory: {}\n\n{}",
                contact.name,
                contact.email,
                contact.category.as_deref().unwrap_or("-"),
                contact.message,
            ),
        );
        self.dispatch(email);
    }

    /// Notify the site operator that a post went live.
    pub fn post_published(&self, post: &BlogPost) {
        let email = Email::new(
            &self.from_address,
            &self.admin_address,
            format!("Published: {}", post.title),
            format!(
                "\"{}\" is now live{}.",
                post.title,
                if post.members_only {
                    " (members only)"
                } else {
                    ""
                },
            ),
        );
        self.dispatch(email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::NewContact;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> Result<()> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn contact_notification_reaches_admin_address() {
        let mailer = Arc::new(RecordingMailer::default());
        let config = EmailConfig {
            backend: "console".to_string(),
            from_address: "noreply@example.com".to_string(),
            admin_address: "admin@example.com".to_string(),
        };
        let notifier = Notifier::new(mailer.clone(), &config);

        let contact = Contact::new(NewContact {
            name: "Fan".to_string(),
            email: "fan@example.com".to_string(),
            phone: None,
            category: None,
            subject: "Booking".to_string(),
            message: "Play our festival".to_string(),
        });
        notifier.contact_received(&contact);

        // The send is spawned; give it a beat to land.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "admin@example.com");
        assert!(sent[0].subject.contains("Booking"));
    }
}
