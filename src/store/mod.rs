//! Persistence traits and backends.
//!
//! Every store is a trait so the HTTP layer never knows what sits behind it;
//! the application's startup routine constructs one backend and hands it to
//! handlers through [`crate::app::AppState`]. The in-memory backend in
//! [`memory`] implements every store trait on one struct, which also gives
//! account deletion its subscription-row cascade for free.

pub mod memory;
pub mod users;

pub use memory::InMemoryStore;
pub use users::{OAuthIdentity, ProfileUpdate, UserRecord, UserStore};
