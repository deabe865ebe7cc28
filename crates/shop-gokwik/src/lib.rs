//! # shop-gokwik
//!
//! Gokwik payment gateway integration for onyx-shop.
//!
//! This crate provides:
//!
//! 1. **GokwikGateway** — order-creation client used by the payment bridge
//!    after the local order is durable. Amounts go out in the gateway's
//!    minor-unit convention; credentials stay server-side.
//!
//! 2. **Webhook utilities** — HMAC-SHA256 signature verification over the raw
//!    request body, payload parsing, and mapping of the gateway's payment
//!    vocabulary onto the order lifecycle.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_gokwik::GokwikGateway;
//! use shop_core::PaymentGateway;
//!
//! let gateway = GokwikGateway::from_env()?;
//! let created = gateway.create_gateway_order(&order).await?;
//! // Record created.gateway_order_id on the order
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use shop_gokwik::webhook;
//!
//! webhook::verify_signature(&secret, &body, signature_header)?;
//! let notice = webhook::parse_payload(&body)?;
//! let next = webhook::map_payment_status(&notice.payment_status);
//! ```

pub mod client;
pub mod config;
pub mod webhook;

// Re-exports
pub use client::GokwikGateway;
pub use config::GokwikConfig;
pub use webhook::{
    map_payment_status, parse_payload, sign_body, verify_signature, WebhookNotice,
    SIGNATURE_HEADER,
};
