//! # Gokwik Order Client
//!
//! HTTP client for the gateway's order-creation API. Called by the payment
//! bridge after the local order row and its lines are durable.

use crate::config::GokwikConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shop_core::{GatewayOrder, Order, PaymentGateway, ShopError, ShopResult};
use tracing::{debug, error, info, instrument};

/// Gokwik gateway implementation
pub struct GokwikGateway {
    config: GokwikConfig,
    client: Client,
}

impl GokwikGateway {
    pub fn new(config: GokwikConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ShopError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        let config = GokwikConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &GokwikConfig {
        &self.config
    }
}

#[async_trait]
impl PaymentGateway for GokwikGateway {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn create_gateway_order(&self, order: &Order) -> ShopResult<GatewayOrder> {
        // Price already holds the amount in minor units, which is the
        // gateway's convention.
        let request = GokwikOrderRequest {
            amount: order.total.amount,
            currency: order.total.currency.as_str().to_uppercase(),
            receipt: order.id.to_string(),
            notes: GokwikOrderNotes {
                user_id: order.user_id.to_string(),
            },
        };

        debug!(
            "Creating gateway order: amount={} {}",
            request.amount, request.currency
        );

        let url = format!("{}/v1/orders", self.config.api_base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Gokwik API error: status={}, body={}", status, body);

            if let Ok(err_response) = serde_json::from_str::<GokwikErrorResponse>(&body) {
                return Err(ShopError::Gateway {
                    gateway: "gokwik".to_string(),
                    message: err_response.error.description,
                });
            }

            return Err(ShopError::Gateway {
                gateway: "gokwik".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let raw_response: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ShopError::Serialization(format!("Failed to parse Gokwik response: {}", e)))?;

        let created: GokwikOrderResponse = serde_json::from_value(raw_response.clone())
            .map_err(|e| ShopError::Serialization(format!("Unexpected Gokwik order shape: {}", e)))?;

        info!("Created gateway order: id={}", created.id);

        Ok(GatewayOrder {
            gateway_order_id: created.id,
            raw_response,
        })
    }

    fn gateway_name(&self) -> &'static str {
        "gokwik"
    }

    fn public_key(&self) -> &str {
        &self.config.public_key
    }
}

// =============================================================================
// Gokwik API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct GokwikOrderRequest {
    /// Amount in the gateway's minor-unit convention
    amount: i64,
    currency: String,
    /// Our order id, echoed back by the gateway
    receipt: String,
    notes: GokwikOrderNotes,
}

#[derive(Debug, Serialize)]
struct GokwikOrderNotes {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct GokwikOrderResponse {
    id: String,
    #[serde(default)]
    #[allow(dead_code)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GokwikErrorResponse {
    error: GokwikErrorBody,
}

#[derive(Debug, Deserialize)]
struct GokwikErrorBody {
    description: String,
    #[serde(default)]
    #[allow(dead_code)]
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::{Currency, Price};
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer) -> GokwikGateway {
        let config = GokwikConfig::new("key_test", "secret_test", "pk_onyx")
            .with_api_base_url(server.uri());
        GokwikGateway::new(config).unwrap()
    }

    fn order() -> Order {
        Order::new(
            Uuid::new_v4(),
            Price::new(250.0, Currency::INR),
            "12 MG Road, Bengaluru, KA 560001",
            "gokwik",
        )
    }

    #[tokio::test]
    async fn test_create_gateway_order_sends_minor_units() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .and(body_partial_json(serde_json::json!({
                "amount": 25000,
                "currency": "INR"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "gw_order_abc123",
                "status": "created"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let created = gateway.create_gateway_order(&order()).await.unwrap();

        assert_eq!(created.gateway_order_id, "gw_order_abc123");
        assert_eq!(created.raw_response["status"], "created");
    }

    #[tokio::test]
    async fn test_gateway_error_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "description": "amount below minimum", "code": "BAD_REQUEST" }
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let err = gateway.create_gateway_order(&order()).await.unwrap_err();

        match err {
            ShopError::Gateway { gateway, message } => {
                assert_eq!(gateway, "gokwik");
                assert_eq!(message, "amount below minimum");
            }
            other => panic!("expected gateway error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_network_error() {
        // Point at a closed port
        let config = GokwikConfig::new("key_test", "secret_test", "pk_onyx")
            .with_api_base_url("http://127.0.0.1:1");
        let gateway = GokwikGateway::new(config).unwrap();

        let err = gateway.create_gateway_order(&order()).await.unwrap_err();
        assert!(matches!(err, ShopError::Network(_)));
        assert!(err.is_retryable());
    }
}
