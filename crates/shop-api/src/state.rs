//! # Application State
//!
//! Shared state for the Axum application: the product catalog, the
//! persistence stores, the identity provider, and the payment gateway.
//! Everything is injected here at startup and torn down with the process;
//! handlers hold no ambient globals.

use shop_core::{
    BoxedPaymentGateway, CartStore, IdentityProvider, MemoryStore, OrderStore, ProductCatalog,
    StaticIdentityProvider, WishlistStore,
};
use shop_gokwik::GokwikGateway;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Product catalog (read-only here)
    pub catalog: Arc<ProductCatalog>,
    /// Cart line persistence
    pub carts: Arc<dyn CartStore>,
    /// Wishlist membership persistence
    pub wishlists: Arc<dyn WishlistStore>,
    /// Order persistence
    pub orders: Arc<dyn OrderStore>,
    /// Bearer-token resolution
    pub identity: Arc<dyn IdentityProvider>,
    /// Payment gateway
    pub gateway: BoxedPaymentGateway,
    /// Webhook signing secret; absent means unverified (degraded) mode
    pub webhook_secret: Option<String>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create the production state: catalog from config, in-memory stores,
    /// token registry and gateway from environment.
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let catalog = Arc::new(load_product_catalog()?);

        let store = Arc::new(MemoryStore::new());

        let identity = match std::env::var("SHOP_API_TOKENS") {
            Ok(spec) => StaticIdentityProvider::from_spec(&spec)
                .map_err(|e| anyhow::anyhow!("Failed to parse SHOP_API_TOKENS: {}", e))?,
            Err(_) => StaticIdentityProvider::new(),
        };

        let gateway = GokwikGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Gokwik: {}", e))?;
        let webhook_secret = gateway.config().webhook_secret.clone();

        Ok(Self {
            catalog,
            carts: store.clone(),
            wishlists: store.clone(),
            orders: store,
            identity: Arc::new(identity),
            gateway: Arc::new(gateway),
            webhook_secret,
            config,
        })
    }

    /// Assemble a state from explicit parts (tests, alternate wiring)
    pub fn with_parts(
        catalog: ProductCatalog,
        store: Arc<MemoryStore>,
        identity: Arc<dyn IdentityProvider>,
        gateway: BoxedPaymentGateway,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            carts: store.clone(),
            wishlists: store.clone(),
            orders: store,
            identity,
            gateway,
            webhook_secret,
            config: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
            },
        }
    }
}

/// Load product catalog from config file
fn load_product_catalog() -> anyhow::Result<ProductCatalog> {
    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ProductCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    tracing::warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");

        let config = AppConfig::from_env();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(!config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }
}
