//! # Payment Gateway Trait
//!
//! Seam between the order bridge and the external payment processor. The
//! bridge persists the order first, then asks the gateway for a gateway-side
//! order; a second processor would implement this trait the same way.

use crate::error::ShopResult;
use crate::order::Order;
use async_trait::async_trait;
use std::sync::Arc;

/// A gateway-side order created during payment initiation
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    /// The gateway's identifier for this order
    pub gateway_order_id: String,
    /// Raw gateway response, kept on the order for audit
    pub raw_response: serde_json::Value,
}

/// External payment processor contract
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register the order with the gateway and obtain its order id. Amounts
    /// are sent in the gateway's minor-unit convention.
    async fn create_gateway_order(&self, order: &Order) -> ShopResult<GatewayOrder>;

    /// Gateway name recorded on orders (for logging and audit)
    fn gateway_name(&self) -> &'static str;

    /// Public (non-secret) key the client needs for the gateway's payment UI
    fn public_key(&self) -> &str;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;
