//! # Gokwik Webhook Handling
//!
//! Signature verification and payload parsing for the gateway's asynchronous
//! payment-status callbacks. Verification is HMAC-SHA256 over the raw request
//! body, compared constant-time against the `sha256=<hex>` signature header.

use shop_core::{OrderStatus, ShopError, ShopResult};
use serde::Deserialize;
use uuid::Uuid;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "x-gokwik-signature";

/// Payment statuses the gateway reports as a successful payment
const SUCCESS_STATUSES: &[&str] = &["success", "paid", "captured"];

/// A parsed, validated webhook notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookNotice {
    pub order_id: Uuid,
    pub payment_status: String,
    pub payment_id: String,
}

#[derive(Debug, Deserialize)]
struct RawWebhookPayload {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    payment_id: Option<String>,
}

/// Parse and validate a webhook body. A missing order id is a hard error,
/// never a silent no-op.
pub fn parse_payload(body: &[u8]) -> ShopResult<WebhookNotice> {
    let raw: RawWebhookPayload = serde_json::from_slice(body)
        .map_err(|e| ShopError::WebhookParse(format!("Malformed webhook body: {}", e)))?;

    let order_id = raw.order_id.ok_or(ShopError::MissingOrderRef)?;
    let order_id = Uuid::parse_str(&order_id)
        .map_err(|_| ShopError::WebhookParse(format!("Invalid order_id: {}", order_id)))?;

    let payment_status = raw
        .payment_status
        .ok_or_else(|| ShopError::WebhookParse("Missing payment_status".to_string()))?;
    let payment_id = raw
        .payment_id
        .ok_or_else(|| ShopError::WebhookParse("Missing payment_id".to_string()))?;

    Ok(WebhookNotice {
        order_id,
        payment_status,
        payment_id,
    })
}

/// Map the gateway's payment-status vocabulary onto the order lifecycle:
/// success-equivalent statuses confirm the order, everything else fails it.
pub fn map_payment_status(payment_status: &str) -> OrderStatus {
    if SUCCESS_STATUSES.contains(&payment_status.to_lowercase().as_str()) {
        OrderStatus::Confirmed
    } else {
        OrderStatus::Failed
    }
}

/// Verify the signature header against the raw body. Fails closed: any
/// mismatch or malformed header rejects the delivery before state changes.
pub fn verify_signature(secret: &str, body: &[u8], signature_header: &str) -> ShopResult<()> {
    let expected = format!("sha256={}", compute_hmac_sha256(secret, body));

    if !constant_time_compare(signature_header, &expected) {
        return Err(ShopError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }
    Ok(())
}

/// Compute the signature a sender would attach (also used by tests)
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    format!("sha256={}", compute_hmac_sha256(secret, body))
}

fn compute_hmac_sha256(secret: &str, message: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(message);
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
