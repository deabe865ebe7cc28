//! # Identity
//!
//! Contract for the hosted identity/session provider. The storefront never
//! manages passwords or mints tokens; it only resolves a bearer token to an
//! identity. Sign-in, sign-up, OAuth, and password reset all live on the
//! provider's own surface.

use crate::error::{ShopError, ShopResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A resolved visitor identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

impl Identity {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

/// Resolves bearer tokens to identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token. Fails with `AuthRequired` when the token is
    /// missing, expired, or unknown.
    async fn verify_token(&self, token: &str) -> ShopResult<Identity>;
}

/// In-memory token registry. Stands in for the hosted provider in local
/// deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a token for an identity
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    /// Parse `token=email` pairs separated by commas, e.g.
    /// `SHOP_API_TOKENS="tok-priya=priya@example.com,tok-arjun=arjun@example.com"`.
    /// Each entry gets a fresh identity id at startup.
    pub fn from_spec(spec: &str) -> ShopResult<Self> {
        let mut provider = Self::new();
        for pair in spec.split(',').filter(|s| !s.trim().is_empty()) {
            let (token, email) = pair.trim().split_once('=').ok_or_else(|| {
                ShopError::Configuration(format!("Malformed token entry: {}", pair))
            })?;
            provider
                .tokens
                .insert(token.to_string(), Identity::new(Uuid::new_v4(), email));
        }
        Ok(provider)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify_token(&self, token: &str) -> ShopResult<Identity> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ShopError::AuthRequired("Invalid or expired token".to_string()))
    }
}
