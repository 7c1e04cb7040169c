//! Encore: backend for an artist/musician site with a membership system.
//!
//! Public content (biography, concerts, discography, blog) is served with
//! member gating: members-only articles degrade to a teaser for
//! unauthorized viewers instead of a hard denial. Membership has a free
//! tier and a paid gold tier billed through Stripe; the user's role is a
//! cached projection of subscription status, recomputed on every verified
//! webhook event. An admin surface manages content and the contact inbox.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use encore::{App, AppState, ConfigBuilder, Stores};
//! use encore::auth::HttpIdentityProvider;
//! use encore::billing::MockStripeClient;
//! use encore::email::ConsoleMailer;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     encore::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build().expect("config");
//!     let identity = Arc::new(HttpIdentityProvider::new(config.oauth.clone()));
//!
//!     let state = AppState::new(
//!         config,
//!         Stores::in_memory(),
//!         Arc::new(MockStripeClient::new()),
//!         identity,
//!         Arc::new(ConsoleMailer::new()),
//!     );
//!     App::new(state).serve().await
//! }
//! ```

pub mod access;
pub mod api;
mod app;
pub mod auth;
pub mod billing;
pub mod config;
pub mod contacts;
pub mod content;
pub mod email;
mod error;
pub mod http;
pub mod ratelimit;
pub mod roles;
pub mod store;
pub mod testing;
pub mod validation;

pub use app::{App, AppState, Stores};
pub use config::{Config, ConfigBuilder};
pub use error::{EncoreError, Result};
pub use roles::Role;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with sensible defaults.
///
/// Call early in `main()`. `RUST_LOG` controls the filter;
/// `ENCORE_LOG_JSON=true` switches to JSON output.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("ENCORE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing from the application's own configuration.
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
