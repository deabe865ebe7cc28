//! # Order Submission Flow
//!
//! Turns a cart snapshot plus a shipping address into a payment-initiation
//! request against the gateway bridge. One submission attempt walks
//! `CollectingAddress -> Submitting -> {AwaitingPayment, SubmissionFailed}`.
//! Validation failures never reach the network, and a failed submission
//! leaves the cart untouched.

use crate::cart::SessionLine;
use crate::error::{ShopError, ShopResult};
use crate::identity::Identity;
use crate::product::{Currency, Price};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Structured shipping address collected from the checkout form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl ShippingAddress {
    /// Names of required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        if self.line1.trim().is_empty() {
            missing.push("line1");
        }
        if self.city.trim().is_empty() {
            missing.push("city");
        }
        if self.state.trim().is_empty() {
            missing.push("state");
        }
        if self.postal_code.trim().is_empty() {
            missing.push("postal_code");
        }
        missing
    }

    pub fn validate(&self) -> ShopResult<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ShopError::Validation(format!(
                "Missing address fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Single-line form sent on the wire and persisted on the order
    pub fn formatted(&self) -> String {
        let mut parts = vec![self.line1.clone()];
        if let Some(line2) = &self.line2 {
            if !line2.trim().is_empty() {
                parts.push(line2.clone());
            }
        }
        parts.push(self.city.clone());
        parts.push(format!("{} {}", self.state, self.postal_code));
        parts.join(", ")
    }
}

/// One item of a cart snapshot, price fixed at snapshot time
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Price,
}

/// The cart as captured at submission time. The total computed here is the
/// amount sent to the gateway bridge and is never re-derived from live
/// catalog prices.
#[derive(Debug, Clone, Default)]
pub struct CartSnapshot {
    pub items: Vec<SnapshotItem>,
    pub currency: Currency,
}

impl CartSnapshot {
    pub fn from_lines(lines: &[SessionLine]) -> Self {
        let currency = lines
            .first()
            .map(|l| l.product.price.currency)
            .unwrap_or_default();
        Self {
            items: lines
                .iter()
                .map(|l| SnapshotItem {
                    product_id: l.product.id.clone(),
                    quantity: l.quantity,
                    unit_price: l.product.effective_price(),
                })
                .collect(),
            currency,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> Price {
        let amount: i64 = self
            .items
            .iter()
            .map(|i| i.unit_price.amount * i.quantity as i64)
            .sum();
        Price::from_minor(amount, self.currency)
    }
}

/// Wire item for the payment-initiation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentItem {
    pub product_id: String,
    pub quantity: u32,
    /// Unit price in decimal currency units
    pub price: f64,
}

/// Payment Gateway Bridge request contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: Uuid,
    /// Decimal currency units; the bridge converts to the gateway's
    /// minor-unit convention
    pub amount: f64,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub items: Vec<PaymentItem>,
    pub shipping_address: String,
}

/// Payment Gateway Bridge response contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Public (non-secret) key the client needs to render the gateway's
    /// payment UI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The bridge as seen from the submission flow: one call that either yields a
/// payment handle or fails.
#[async_trait]
pub trait PaymentBridge: Send + Sync {
    async fn initiate_payment(&self, request: &PaymentRequest) -> ShopResult<PaymentResponse>;
}

/// States of a single submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    CollectingAddress,
    Submitting,
    AwaitingPayment,
    SubmissionFailed,
}

/// Drives one submission attempt through the bridge
pub struct CheckoutFlow {
    state: CheckoutState,
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self {
            state: CheckoutState::CollectingAddress,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Submit the cart snapshot. Preconditions (identity, address, non-empty
    /// cart) fail before any network call and leave the flow in
    /// `CollectingAddress`. A bridge failure lands in `SubmissionFailed`;
    /// the cart itself is never mutated here.
    pub async fn submit(
        &mut self,
        identity: Option<&Identity>,
        snapshot: &CartSnapshot,
        address: &ShippingAddress,
        bridge: &dyn PaymentBridge,
    ) -> ShopResult<PaymentResponse> {
        let identity = identity.ok_or_else(|| {
            ShopError::AuthRequired("Sign in to continue with payment".to_string())
        })?;
        address.validate()?;
        if snapshot.is_empty() {
            return Err(ShopError::Validation("Cart is empty".to_string()));
        }

        self.state = CheckoutState::Submitting;

        let total = snapshot.total();
        let request = PaymentRequest {
            order_id: Uuid::new_v4(),
            amount: total.as_decimal(),
            currency: snapshot.currency.as_str().to_string(),
            customer_name: address.name.clone(),
            customer_email: identity.email.clone(),
            customer_phone: address.phone.clone(),
            items: snapshot
                .items
                .iter()
                .map(|i| PaymentItem {
                    product_id: i.product_id.clone(),
                    quantity: i.quantity,
                    price: i.unit_price.as_decimal(),
                })
                .collect(),
            shipping_address: address.formatted(),
        };

        info!(
            "Submitting order: {} items, total={}",
            request.items.len(),
            total.display()
        );

        match bridge.initiate_payment(&request).await {
            Ok(response) if response.success => {
                self.state = CheckoutState::AwaitingPayment;
                Ok(response)
            }
            Ok(response) => {
                self.state = CheckoutState::SubmissionFailed;
                Ok(response)
            }
            Err(e) => {
                self.state = CheckoutState::SubmissionFailed;
                Err(e)
            }
        }
    }
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}
