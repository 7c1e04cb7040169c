//! Inbound contact inquiries.
//!
//! Created only by the public (rate-limited) form; afterwards the record
//! belongs to the admin side. Status moves forward only; an inquiry is
//! archived, never deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::http::PageQuery;

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub category: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Workflow state of an inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Unread,
    Read,
    Replied,
    Archived,
}

impl ContactStatus {
    fn ordinal(self) -> u8 {
        match self {
            ContactStatus::Unread => 0,
            ContactStatus::Read => 1,
            ContactStatus::Replied => 2,
            ContactStatus::Archived => 3,
        }
    }

    /// Status only moves forward; skipping steps is allowed (unread can go
    /// straight to archived), going back is not.
    #[must_use]
    pub fn can_transition_to(self, next: ContactStatus) -> bool {
        next.ordinal() > self.ordinal()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::Unread => "unread",
            ContactStatus::Read => "read",
            ContactStatus::Replied => "replied",
            ContactStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Public contact-form payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewContact {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, max = 10000, message = "message is required"))]
    pub message: String,
}

impl Contact {
    #[must_use]
    pub fn new(input: NewContact) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            category: input.category,
            subject: input.subject,
            message: input.message,
            status: ContactStatus::Unread,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert_contact(&self, contact: &Contact) -> Result<()>;

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>>;

    /// Overwrite the status. Errors with `NotFound` if missing. Transition
    /// legality is the caller's concern; the store just writes.
    async fn set_contact_status(&self, id: &str, status: ContactStatus) -> Result<Contact>;

    /// Newest first. `status: None` is the default working view, every
    /// status except archived. An explicit filter returns only that status.
    async fn list_contacts(
        &self,
        status: Option<ContactStatus>,
        page: &PageQuery,
    ) -> Result<(Vec<Contact>, u64)>;
}
