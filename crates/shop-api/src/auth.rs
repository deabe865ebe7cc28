//! # Request Authentication
//!
//! Bearer-token extraction and resolution against the identity provider.

use crate::state::AppState;
use axum::http::HeaderMap;
use shop_core::{Identity, ShopError, ShopResult};

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> ShopResult<&str> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ShopError::AuthRequired("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ShopError::AuthRequired("Malformed authorization header".to_string()))
}

/// Resolve the request's bearer token to an identity
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> ShopResult<Identity> {
    let token = bearer_token(headers)?;
    state.identity.verify_token(token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer tok-abc"));
        assert_eq!(bearer_token(&headers).unwrap(), "tok-abc");
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(ShopError::AuthRequired(_))
        ));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcg=="));
        assert!(matches!(
            bearer_token(&headers),
            Err(ShopError::AuthRequired(_))
        ));
    }
}
