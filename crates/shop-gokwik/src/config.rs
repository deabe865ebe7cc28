//! # Gokwik Configuration
//!
//! Configuration for the Gokwik gateway integration. All credentials are
//! loaded from environment variables server-side; only the public key is ever
//! returned to clients.

use shop_core::ShopError;
use std::env;

/// Gokwik API configuration
#[derive(Debug, Clone)]
pub struct GokwikConfig {
    /// API key id used to authenticate order-creation calls
    pub api_key: String,

    /// API secret paired with the key (never leaves the server)
    pub api_secret: String,

    /// Public key the client needs to render the gateway's payment UI
    pub public_key: String,

    /// Shared secret for webhook signature verification. When absent the
    /// webhook receiver runs unverified (degraded mode).
    pub webhook_secret: Option<String>,

    /// API base URL (overridable for testing/mocking)
    pub api_base_url: String,
}

impl GokwikConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `GOKWIK_API_KEY`
    /// - `GOKWIK_API_SECRET`
    /// - `GOKWIK_PUBLIC_KEY`
    ///
    /// Optional:
    /// - `GOKWIK_WEBHOOK_SECRET`
    /// - `GOKWIK_API_BASE_URL`
    pub fn from_env() -> Result<Self, ShopError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_key = env::var("GOKWIK_API_KEY")
            .map_err(|_| ShopError::Configuration("GOKWIK_API_KEY not set".to_string()))?;

        let api_secret = env::var("GOKWIK_API_SECRET")
            .map_err(|_| ShopError::Configuration("GOKWIK_API_SECRET not set".to_string()))?;

        let public_key = env::var("GOKWIK_PUBLIC_KEY")
            .map_err(|_| ShopError::Configuration("GOKWIK_PUBLIC_KEY not set".to_string()))?;

        if api_key.trim().is_empty() || api_secret.trim().is_empty() {
            return Err(ShopError::Configuration(
                "Gokwik credentials must not be empty".to_string(),
            ));
        }

        let webhook_secret = env::var("GOKWIK_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let api_base_url = env::var("GOKWIK_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.gokwik.co".to_string());

        Ok(Self {
            api_key,
            api_secret,
            public_key,
            webhook_secret,
            api_base_url,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            public_key: public_key.into(),
            webhook_secret: None,
            api_base_url: "https://api.gokwik.co".to_string(),
        }
    }

    /// Builder: set the webhook secret
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Whether webhook deliveries will be signature-verified
    pub fn verifies_webhooks(&self) -> bool {
        self.webhook_secret.is_some()
    }
}
