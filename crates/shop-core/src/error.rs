//! # Storefront Error Types
//!
//! Typed error handling for the onyx-shop storefront.
//! All fallible operations return `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for all storefront operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The caller must sign in before the operation can proceed.
    /// Surfaced as a sign-in prompt, not a fatal failure.
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// Missing or malformed user input; never reaches the network
    #[error("Validation error: {0}")]
    Validation(String),

    /// Product not found in catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Order not found in the store
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Illegal order status transition
    #[error("Invalid order transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// The datastore rejected a read/write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Payment gateway rejected the request
    #[error("Gateway error [{gateway}]: {message}")]
    Gateway { gateway: String, message: String },

    /// Network/HTTP error communicating with the gateway
    #[error("Network error: {0}")]
    Network(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Webhook payload carried no order reference
    #[error("Missing order_id in webhook payload")]
    MissingOrderRef,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Returns true if this error is transient and worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShopError::Network(_) | ShopError::Gateway { .. })
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Configuration(_) => 500,
            ShopError::AuthRequired(_) => 401,
            ShopError::Validation(_) => 400,
            ShopError::ProductNotFound { .. } => 404,
            ShopError::OrderNotFound { .. } => 404,
            ShopError::InvalidTransition { .. } => 409,
            ShopError::Storage(_) => 500,
            ShopError::Gateway { .. } => 502,
            ShopError::Network(_) => 503,
            ShopError::WebhookVerificationFailed(_) => 401,
            ShopError::WebhookParse(_) => 400,
            ShopError::MissingOrderRef => 400,
            ShopError::Serialization(_) => 500,
            ShopError::Internal(_) => 500,
        }
    }
}

/// Result type alias for storefront operations
pub type ShopResult<T> = Result<T, ShopError>;
