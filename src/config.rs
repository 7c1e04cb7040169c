//! Application configuration.
//!
//! Built through [`ConfigBuilder`], either programmatically or from
//! `ENCORE_*` environment variables, and validated once at startup. Secrets
//! are held in [`SecretString`] so they never land in debug output.

use secrecy::SecretString;
use std::net::SocketAddr;

use crate::error::{EncoreError, Result};

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("ENCORE_{name}")).ok()
}

/// Top-level configuration for the server.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub oauth: OAuthConfig,
    pub billing: BillingConfig,
    pub email: EmailConfig,
    pub contact_rate_limit: ContactRateLimitConfig,
    /// Allowed CORS origins; empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl ServerConfig {
    pub fn addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Bearer-token issuance and verification settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing key for self-issued tokens.
    pub token_secret: SecretString,
    pub issuer: String,
    pub audience: String,
    /// Token lifetime in seconds.
    pub token_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: SecretString::new(String::new()),
            issuer: "encore".to_string(),
            audience: "encore-web".to_string(),
            token_ttl_seconds: 60 * 60,
        }
    }
}

/// External identity provider (authorization-code flow).
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Short provider name recorded on user rows (e.g. "google").
    pub provider_name: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub token_url: String,
    pub userinfo_url: String,
    /// The redirect URI registered with the provider (this server's
    /// callback endpoint).
    pub redirect_uri: String,
    /// Where the browser lands after sign-in, carrying the issued token.
    pub frontend_url: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            provider_name: "google".to_string(),
            client_id: String::new(),
            client_secret: SecretString::new(String::new()),
            token_url: String::new(),
            userinfo_url: String::new(),
            redirect_uri: String::new(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Stripe billing settings for the single gold tier.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Stripe secret API key; empty means the mock client is used.
    pub secret_key: SecretString,
    /// Webhook endpoint signing secret.
    pub webhook_secret: SecretString,
    /// Price ID of the gold subscription.
    pub gold_price_id: String,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    pub portal_return_url: String,
    pub trial_days: Option<u32>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            secret_key: SecretString::new(String::new()),
            webhook_secret: SecretString::new(String::new()),
            gold_price_id: String::new(),
            checkout_success_url: "http://localhost:3000/membership/welcome".to_string(),
            checkout_cancel_url: "http://localhost:3000/membership".to_string(),
            portal_return_url: "http://localhost:3000/membership".to_string(),
            trial_days: None,
        }
    }
}

/// Outbound notification settings. SMTP transport details come from the
/// mailer's own environment (see [`crate::email::SmtpConfig`]).
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// "console" (default) or "smtp".
    pub backend: String,
    pub from_address: String,
    /// Where contact-form notifications are delivered.
    pub admin_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend: "console".to_string(),
            from_address: "noreply@example.com".to_string(),
            admin_address: "admin@example.com".to_string(),
        }
    }
}

/// Rate limiting for the public contact form.
#[derive(Debug, Clone)]
pub struct ContactRateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
    /// Only trust X-Forwarded-For when the server sits behind a proxy that
    /// sets it; otherwise clients could spoof their way past the limit.
    pub trust_proxy: bool,
}

impl Default for ContactRateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_seconds: 300,
            trust_proxy: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            auth: AuthConfig::default(),
            oauth: OAuthConfig::default(),
            billing: BillingConfig::default(),
            email: EmailConfig::default(),
            contact_rate_limit: ContactRateLimitConfig::default(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for [`Config`] with environment-variable support.
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_token_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.auth.token_secret = SecretString::new(secret.into());
        self
    }

    pub fn with_token_ttl_seconds(mut self, ttl: u64) -> Self {
        self.config.auth.token_ttl_seconds = ttl;
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.billing.webhook_secret = SecretString::new(secret.into());
        self
    }

    pub fn with_gold_price_id(mut self, price_id: impl Into<String>) -> Self {
        self.config.billing.gold_price_id = price_id.into();
        self
    }

    pub fn with_frontend_url(mut self, url: impl Into<String>) -> Self {
        self.config.oauth.frontend_url = url.into();
        self
    }

    pub fn with_contact_rate_limit(mut self, max_requests: u32, window_seconds: u64) -> Self {
        self.config.contact_rate_limit.max_requests = max_requests;
        self.config.contact_rate_limit.window_seconds = window_seconds;
        self
    }

    /// Load settings from `ENCORE_*` environment variables.
    pub fn from_env(mut self) -> Self {
        if let Some(host) = env_var("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = env_var("PORT").and_then(|p| p.parse().ok()) {
            self.config.server.port = port;
        }
        if let Some(size) = env_var("MAX_BODY_SIZE").and_then(|s| s.parse().ok()) {
            self.config.server.max_body_size = size;
        }
        if let Some(level) = env_var("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = env_var("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        if let Some(secret) = env_var("TOKEN_SECRET") {
            self.config.auth.token_secret = SecretString::new(secret);
        }
        if let Some(issuer) = env_var("TOKEN_ISSUER") {
            self.config.auth.issuer = issuer;
        }
        if let Some(audience) = env_var("TOKEN_AUDIENCE") {
            self.config.auth.audience = audience;
        }
        if let Some(ttl) = env_var("TOKEN_TTL_SECONDS").and_then(|v| v.parse().ok()) {
            self.config.auth.token_ttl_seconds = ttl;
        }

        if let Some(name) = env_var("OAUTH_PROVIDER") {
            self.config.oauth.provider_name = name;
        }
        if let Some(id) = env_var("OAUTH_CLIENT_ID") {
            self.config.oauth.client_id = id;
        }
        if let Some(secret) = env_var("OAUTH_CLIENT_SECRET") {
            self.config.oauth.client_secret = SecretString::new(secret);
        }
        if let Some(url) = env_var("OAUTH_TOKEN_URL") {
            self.config.oauth.token_url = url;
        }
        if let Some(url) = env_var("OAUTH_USERINFO_URL") {
            self.config.oauth.userinfo_url = url;
        }
        if let Some(uri) = env_var("OAUTH_REDIRECT_URI") {
            self.config.oauth.redirect_uri = uri;
        }
        if let Some(url) = env_var("FRONTEND_URL") {
            self.config.oauth.frontend_url = url;
        }

        if let Some(key) = env_var("STRIPE_SECRET_KEY") {
            self.config.billing.secret_key = SecretString::new(key);
        }
        if let Some(secret) = env_var("STRIPE_WEBHOOK_SECRET") {
            self.config.billing.webhook_secret = SecretString::new(secret);
        }
        if let Some(price) = env_var("GOLD_PRICE_ID") {
            self.config.billing.gold_price_id = price;
        }
        if let Some(url) = env_var("CHECKOUT_SUCCESS_URL") {
            self.config.billing.checkout_success_url = url;
        }
        if let Some(url) = env_var("CHECKOUT_CANCEL_URL") {
            self.config.billing.checkout_cancel_url = url;
        }
        if let Some(url) = env_var("PORTAL_RETURN_URL") {
            self.config.billing.portal_return_url = url;
        }
        if let Some(days) = env_var("GOLD_TRIAL_DAYS").and_then(|v| v.parse().ok()) {
            self.config.billing.trial_days = Some(days);
        }

        if let Some(backend) = env_var("EMAIL_BACKEND") {
            self.config.email.backend = backend;
        }
        if let Some(from) = env_var("EMAIL_FROM") {
            self.config.email.from_address = from;
        }
        if let Some(admin) = env_var("EMAIL_ADMIN") {
            self.config.email.admin_address = admin;
        }

        if let Some(max) = env_var("CONTACT_RATE_MAX").and_then(|v| v.parse().ok()) {
            self.config.contact_rate_limit.max_requests = max;
        }
        if let Some(window) = env_var("CONTACT_RATE_WINDOW_SECONDS").and_then(|v| v.parse().ok()) {
            self.config.contact_rate_limit.window_seconds = window;
        }
        if let Some(trust) = env_var("TRUST_PROXY") {
            self.config.contact_rate_limit.trust_proxy = trust.parse().unwrap_or(false);
        }

        if let Some(origins) = env_var("CORS_ALLOWED_ORIGINS") {
            self.config.cors_allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        self
    }

    /// Validate and produce the final configuration.
    pub fn build(self) -> Result<Config> {
        use secrecy::ExposeSecret;

        self.config.server.addr().map_err(|e| {
            EncoreError::validation(format!(
                "invalid server address {}:{} - {e}",
                self.config.server.host, self.config.server.port
            ))
        })?;

        if self.config.server.port == 0 {
            return Err(EncoreError::validation("server port must be greater than 0"));
        }
        if self.config.server.max_body_size == 0 {
            return Err(EncoreError::validation("max body size must be greater than 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(EncoreError::validation(format!(
                "invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_levels.join(", ")
            )));
        }

        if self.config.auth.token_secret.expose_secret().is_empty() {
            return Err(EncoreError::validation(
                "token secret must be set (ENCORE_TOKEN_SECRET)",
            ));
        }
        if self.config.auth.token_ttl_seconds == 0 {
            return Err(EncoreError::validation("token TTL must be greater than 0"));
        }

        if self.config.contact_rate_limit.max_requests == 0 {
            return Err(EncoreError::validation(
                "contact rate limit max_requests must be greater than 0",
            ));
        }
        if self.config.contact_rate_limit.window_seconds == 0 {
            return Err(EncoreError::validation(
                "contact rate limit window must be greater than 0",
            ));
        }

        url::Url::parse(&self.config.oauth.frontend_url).map_err(|e| {
            EncoreError::validation(format!(
                "invalid frontend URL {}: {e}",
                self.config.oauth.frontend_url
            ))
        })?;

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
