use std::sync::Arc;

use secrecy::ExposeSecret;

use encore::auth::HttpIdentityProvider;
use encore::billing::{LiveStripeClient, MockStripeClient, StripeClient};
use encore::email::{ConsoleMailer, Mailer, SmtpMailer};
use encore::{App, AppState, ConfigBuilder, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    encore::init_tracing();

    let config = ConfigBuilder::new().from_env().build().map_err(|e| {
        anyhow::anyhow!("configuration error: {e}")
    })?;

    let stripe: Arc<dyn StripeClient> = if config.billing.secret_key.expose_secret().is_empty() {
        tracing::warn!("no Stripe secret key configured; using the mock billing client");
        Arc::new(MockStripeClient::new())
    } else {
        Arc::new(
            LiveStripeClient::new(config.billing.secret_key.expose_secret().clone())
                .map_err(|e| anyhow::anyhow!("{e}"))?,
        )
    };

    let mailer: Arc<dyn Mailer> = match config.email.backend.as_str() {
        "smtp" => Arc::new(SmtpMailer::from_env().map_err(|e| anyhow::anyhow!("{e}"))?),
        _ => Arc::new(ConsoleMailer::new()),
    };

    let identity = Arc::new(HttpIdentityProvider::new(config.oauth.clone()));

    let state = AppState::new(config, Stores::in_memory(), stripe, identity, mailer);

    App::new(state).serve().await?;
    Ok(())
}
