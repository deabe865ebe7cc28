//! # Order Types
//!
//! Durable order records and their line-item snapshots. An order is never
//! deleted, only transitioned; line items capture the unit price at the time
//! of purchase and are never re-derived from live catalog prices.

use crate::product::{Currency, Price, Product};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fulfillment/payment lifecycle of an order.
///
/// Transitions are one-directional: `Pending` splits into `Confirmed` or
/// `Failed`; a confirmed order moves through `Shipped` to `Delivered`.
/// `Failed` and `Delivered` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Failed,
}

impl OrderStatus {
    /// Whether moving to `next` respects the one-directional lifecycle
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Failed) | (Confirmed, Shipped) | (Shipped, Delivered)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Failed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// A line item in an order; immutable price snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: Uuid,
    pub product_id: String,
    pub quantity: u32,
    /// Unit price at the time of purchase
    pub unit_price: Price,
}

impl OrderLine {
    pub fn new(order_id: Uuid, product_id: impl Into<String>, quantity: u32, unit_price: Price) -> Self {
        Self {
            order_id,
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Total for this line
    pub fn total(&self) -> Price {
        Price::from_minor(
            self.unit_price.amount * self.quantity as i64,
            self.unit_price.currency,
        )
    }
}

/// A durable record of a checkout attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Total amount fixed at submission time
    pub total: Price,

    /// Shipping address as submitted (single formatted string, as persisted)
    pub shipping_address: String,

    pub status: OrderStatus,

    /// Gateway that handles payment for this order
    pub payment_gateway: String,

    /// Gateway's payment-status vocabulary, recorded verbatim
    pub payment_status: String,

    /// Payment identifier reported by the gateway webhook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,

    /// Gateway-side order identifier, set after payment initiation succeeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,

    /// Raw gateway response, kept for audit/debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_response: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending order
    pub fn new(
        user_id: Uuid,
        total: Price,
        shipping_address: impl Into<String>,
        payment_gateway: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            total,
            shipping_address: shipping_address.into(),
            status: OrderStatus::Pending,
            payment_gateway: payment_gateway.into(),
            payment_status: "pending".to_string(),
            payment_id: None,
            gateway_order_id: None,
            gateway_response: None,
            created_at: Utc::now(),
        }
    }

    /// Guarded status transition
    pub fn transition_to(&mut self, next: OrderStatus) -> crate::error::ShopResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(crate::error::ShopError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

/// An order with its line items and, where the product is still in the
/// catalog, a product snapshot for display. Shape of the order-history read.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLineDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLineDetail {
    #[serde(flatten)]
    pub line: OrderLine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

/// Compute an order total from line snapshots
pub fn total_of_lines(lines: &[OrderLine], currency: Currency) -> Price {
    let amount: i64 = lines.iter().map(|l| l.total().amount).sum();
    Price::from_minor(amount, currency)
}
