//! Application wiring: state construction, router assembly, serving.
//!
//! Every dependency is constructed here at startup and handed to handlers
//! through [`AppState`]: no global clients, no lazily-initialized
//! singletons. Shutdown is graceful: SIGINT/SIGTERM stop the listener and
//! in-flight requests get a short drain period.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::signal;

use crate::auth::{IdentityProvider, TokenIssuer, TokenVerifier};
use crate::billing::{
    BillingStore, CheckoutConfig, CheckoutManager, PortalManager, StripeClient, WebhookHandler,
};
use crate::config::Config;
use crate::contacts::ContactStore;
use crate::content::Autosaver;
use crate::content::biography::BiographyStore;
use crate::content::blog::BlogStore;
use crate::content::concerts::ConcertStore;
use crate::content::discography::ReleaseStore;
use crate::email::{Mailer, Notifier};
use crate::ratelimit::ContactRateLimiter;
use crate::store::{InMemoryStore, UserStore};

/// Debounce window for draft autosave.
const AUTOSAVE_DELAY: Duration = Duration::from_secs(2);

/// The store handles the application runs on.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn BlogStore>,
    pub concerts: Arc<dyn ConcertStore>,
    pub releases: Arc<dyn ReleaseStore>,
    pub biography: Arc<dyn BiographyStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub billing: Arc<dyn BillingStore>,
}

impl Stores {
    /// Back every store with one shared in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_shared(Arc::new(InMemoryStore::new()))
    }

    /// Build the bundle from an existing shared backend (tests seed data
    /// through the concrete handle, then hand it in here).
    #[must_use]
    pub fn from_shared(store: Arc<InMemoryStore>) -> Self {
        Self {
            users: store.clone(),
            posts: store.clone(),
            concerts: store.clone(),
            releases: store.clone(),
            biography: store.clone(),
            contacts: store.clone(),
            billing: store,
        }
    }
}

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn BlogStore>,
    pub concerts: Arc<dyn ConcertStore>,
    pub releases: Arc<dyn ReleaseStore>,
    pub biography: Arc<dyn BiographyStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub billing: Arc<dyn BillingStore>,
    pub verifier: TokenVerifier,
    pub issuer: Arc<TokenIssuer>,
    pub identity: Arc<dyn IdentityProvider>,
    pub checkout: Arc<CheckoutManager>,
    pub portal: Arc<PortalManager>,
    pub webhooks: Arc<WebhookHandler>,
    pub autosaver: Arc<Autosaver>,
    pub notifier: Arc<Notifier>,
    pub contact_limiter: Arc<ContactRateLimiter>,
}

impl AppState {
    /// Wire the full application from its configuration, stores, and
    /// external collaborators.
    #[must_use]
    pub fn new(
        config: Config,
        stores: Stores,
        stripe: Arc<dyn StripeClient>,
        identity: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        use secrecy::ExposeSecret;

        let verifier = TokenVerifier::from_config(&config.auth);
        let issuer = Arc::new(TokenIssuer::from_config(&config.auth));

        let checkout = Arc::new(CheckoutManager::new(
            stores.users.clone(),
            stripe.clone(),
            CheckoutConfig {
                gold_price_id: config.billing.gold_price_id.clone(),
                success_url: config.billing.checkout_success_url.clone(),
                cancel_url: config.billing.checkout_cancel_url.clone(),
                trial_days: config.billing.trial_days,
            },
        ));
        let portal = Arc::new(PortalManager::new(
            stripe,
            config.billing.portal_return_url.clone(),
        ));
        let webhooks = Arc::new(WebhookHandler::new(
            stores.users.clone(),
            stores.billing.clone(),
            config.billing.webhook_secret.expose_secret().clone(),
        ));

        let autosaver = Arc::new(Autosaver::new(stores.posts.clone(), AUTOSAVE_DELAY));
        let notifier = Arc::new(Notifier::new(mailer, &config.email));
        let contact_limiter = Arc::new(ContactRateLimiter::new(&config.contact_rate_limit));

        Self {
            config: Arc::new(config),
            users: stores.users,
            posts: stores.posts,
            concerts: stores.concerts,
            releases: stores.releases,
            biography: stores.biography,
            contacts: stores.contacts,
            billing: stores.billing,
            verifier,
            issuer,
            identity,
            checkout,
            portal,
            webhooks,
            autosaver,
            notifier,
            contact_limiter,
        }
    }
}

/// The running application.
pub struct App {
    state: AppState,
}

impl App {
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// The fully assembled router (used directly by tests).
    #[must_use]
    pub fn router(&self) -> Router {
        crate::api::router(self.state.clone())
    }

    /// Bind and serve until a shutdown signal arrives.
    pub async fn serve(self) -> std::io::Result<()> {
        let addr = self
            .state
            .config
            .server
            .addr()
            .expect("server address was validated at config build time");

        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("server listening on http://{addr}");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

/// Resolve on SIGINT or SIGTERM, then allow a short drain period.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received terminate signal, starting graceful shutdown");
        },
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    tracing::info!("shutdown complete");
}
