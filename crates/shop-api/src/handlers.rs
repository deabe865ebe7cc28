//! # Request Handlers
//!
//! Axum request handlers for the storefront API: catalog reads, per-user
//! cart/wishlist rows, order history, the payment-initiation bridge, and the
//! gateway webhook receiver.

use crate::auth::authenticate;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{
    Currency, Order, OrderLine, OrderLineDetail, OrderWithLines, PaymentRequest, PaymentResponse,
    PaymentUpdateOutcome, Price, ShopError,
};
use shop_gokwik::{map_payment_status, parse_payload, verify_signature, SIGNATURE_HEADER};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

fn shop_error_to_response(err: ShopError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Catalog listing filter
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// Add-to-cart request
#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Quantity update for an existing cart line
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: u32,
}

/// One cart row with its catalog product, when still listed
#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub product_id: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<shop_core::Product>,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub count: u32,
}

/// Wishlist toggle request
#[derive(Debug, Deserialize)]
pub struct WishlistToggleRequest {
    pub product_id: String,
}

#[derive(Debug, Serialize)]
pub struct WishlistToggleResponse {
    pub product_id: String,
    pub in_wishlist: bool,
}

/// Webhook acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// Health & Catalog
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "onyx-shop",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List active products, optionally filtered by category
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> impl IntoResponse {
    let products: Vec<_> = match &query.category {
        Some(category) => state.catalog.in_category(category).collect(),
        None => state.catalog.active_products().collect(),
    };
    Json(serde_json::json!({
        "products": products,
        "count": products.len()
    }))
}

/// Get a single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let product = state.catalog.get(&product_id).ok_or_else(|| {
        shop_error_to_response(ShopError::ProductNotFound {
            product_id: product_id.clone(),
        })
    })?;

    Ok(Json(product.clone()))
}

// =============================================================================
// Cart & Wishlist
// =============================================================================

/// The signed-in user's cart rows, hydrated from the catalog
pub async fn get_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CartView>, HandlerError> {
    let identity = authenticate(&state, &headers)
        .await
        .map_err(shop_error_to_response)?;

    let lines = state
        .carts
        .list_cart_lines(identity.id)
        .await
        .map_err(shop_error_to_response)?;

    let count = lines.iter().map(|l| l.quantity).sum();
    let items = lines
        .into_iter()
        .map(|l| CartItemView {
            product: state.catalog.get(&l.product_id).cloned(),
            product_id: l.product_id,
            quantity: l.quantity,
        })
        .collect();

    Ok(Json(CartView { items, count }))
}

/// Add a product to the cart; an existing line is incremented
#[instrument(skip(state, headers), fields(product_id = %request.product_id))]
pub async fn add_cart_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartItemView>, HandlerError> {
    let identity = authenticate(&state, &headers)
        .await
        .map_err(shop_error_to_response)?;

    if request.quantity == 0 {
        return Err(shop_error_to_response(ShopError::Validation(
            "Quantity must be at least 1".to_string(),
        )));
    }

    let product = state
        .catalog
        .get(&request.product_id)
        .ok_or_else(|| {
            shop_error_to_response(ShopError::ProductNotFound {
                product_id: request.product_id.clone(),
            })
        })?
        .clone();

    if !product.active {
        return Err(shop_error_to_response(ShopError::Validation(format!(
            "Product is not available: {}",
            product.id
        ))));
    }

    let existing = state
        .carts
        .list_cart_lines(identity.id)
        .await
        .map_err(shop_error_to_response)?
        .into_iter()
        .find(|l| l.product_id == request.product_id)
        .map(|l| l.quantity)
        .unwrap_or(0);

    let quantity = existing + request.quantity;
    state
        .carts
        .upsert_cart_line(identity.id, &request.product_id, quantity)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(CartItemView {
        product_id: request.product_id,
        quantity,
        product: Some(product),
    }))
}

/// Set a cart line's quantity; zero deletes the line
pub async fn update_cart_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Json(request): Json<QuantityRequest>,
) -> Result<StatusCode, HandlerError> {
    let identity = authenticate(&state, &headers)
        .await
        .map_err(shop_error_to_response)?;

    if request.quantity == 0 {
        state
            .carts
            .delete_cart_line(identity.id, &product_id)
            .await
            .map_err(shop_error_to_response)?;
        return Ok(StatusCode::NO_CONTENT);
    }

    state
        .carts
        .upsert_cart_line(identity.id, &product_id, request.quantity)
        .await
        .map_err(shop_error_to_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a cart line
pub async fn remove_cart_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    let identity = authenticate(&state, &headers)
        .await
        .map_err(shop_error_to_response)?;

    state
        .carts
        .delete_cart_line(identity.id, &product_id)
        .await
        .map_err(shop_error_to_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user's wishlist
pub async fn get_wishlist(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let identity = authenticate(&state, &headers)
        .await
        .map_err(shop_error_to_response)?;

    let items = state
        .wishlists
        .list_wishlist(identity.id)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(serde_json::json!({
        "items": items,
        "count": items.len()
    })))
}

/// Flip wishlist membership for a product
pub async fn toggle_wishlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<WishlistToggleRequest>,
) -> Result<Json<WishlistToggleResponse>, HandlerError> {
    let identity = authenticate(&state, &headers)
        .await
        .map_err(shop_error_to_response)?;

    let current = state
        .wishlists
        .list_wishlist(identity.id)
        .await
        .map_err(shop_error_to_response)?;

    let in_wishlist = if current.contains(&request.product_id) {
        state
            .wishlists
            .remove_wishlist_entry(identity.id, &request.product_id)
            .await
            .map_err(shop_error_to_response)?;
        false
    } else {
        state
            .wishlists
            .add_wishlist_entry(identity.id, &request.product_id)
            .await
            .map_err(shop_error_to_response)?;
        true
    };

    Ok(Json(WishlistToggleResponse {
        product_id: request.product_id,
        in_wishlist,
    }))
}

// =============================================================================
// Orders
// =============================================================================

fn hydrate(state: &AppState, order: Order, lines: Vec<OrderLine>) -> OrderWithLines {
    OrderWithLines {
        lines: lines
            .into_iter()
            .map(|line| OrderLineDetail {
                product: state.catalog.get(&line.product_id).cloned(),
                line,
            })
            .collect(),
        order,
    }
}

/// Order history for the signed-in user, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderWithLines>>, HandlerError> {
    let identity = authenticate(&state, &headers)
        .await
        .map_err(shop_error_to_response)?;

    let orders = state
        .orders
        .list_orders(identity.id)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(
        orders
            .into_iter()
            .map(|(order, lines)| hydrate(&state, order, lines))
            .collect(),
    ))
}

/// A single order, visible only to its owner
pub async fn get_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderWithLines>, HandlerError> {
    let identity = authenticate(&state, &headers)
        .await
        .map_err(shop_error_to_response)?;

    let orders = state
        .orders
        .list_orders(identity.id)
        .await
        .map_err(shop_error_to_response)?;

    orders
        .into_iter()
        .find(|(order, _)| order.id == order_id)
        .map(|(order, lines)| Json(hydrate(&state, order, lines)))
        .ok_or_else(|| {
            shop_error_to_response(ShopError::OrderNotFound {
                order_id: order_id.to_string(),
            })
        })
}

// =============================================================================
// Payment Gateway Bridge
// =============================================================================

fn validate_payment_request(request: &PaymentRequest) -> Result<Currency, ShopError> {
    if request.items.is_empty() {
        return Err(ShopError::Validation("No items in payment request".to_string()));
    }
    if request.amount <= 0.0 {
        return Err(ShopError::Validation("Amount must be positive".to_string()));
    }
    if request.shipping_address.trim().is_empty() {
        return Err(ShopError::Validation("Missing shipping address".to_string()));
    }
    if request.items.iter().any(|i| i.quantity == 0) {
        return Err(ShopError::Validation(
            "Item quantity must be at least 1".to_string(),
        ));
    }

    let currency = Currency::parse(&request.currency).ok_or_else(|| {
        ShopError::Validation(format!("Unsupported currency: {}", request.currency))
    })?;

    // The submitted amount must equal the line-item sum; the total is a
    // snapshot, never re-derived later.
    let line_total: i64 = request
        .items
        .iter()
        .map(|i| Price::new(i.price, currency).amount * i.quantity as i64)
        .sum();
    if line_total != Price::new(request.amount, currency).amount {
        return Err(ShopError::Validation(
            "Amount does not match line items".to_string(),
        ));
    }

    Ok(currency)
}

/// Payment Gateway Bridge: authenticate, persist the order and its lines
/// atomically, register the order with the gateway, and hand the payment
/// handle back to the client.
#[instrument(skip(state, headers, request), fields(items = request.items.len()))]
pub async fn initiate_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, HandlerError> {
    let identity = authenticate(&state, &headers)
        .await
        .map_err(shop_error_to_response)?;

    let currency = validate_payment_request(&request).map_err(shop_error_to_response)?;

    let order = Order::new(
        identity.id,
        Price::new(request.amount, currency),
        request.shipping_address.clone(),
        state.gateway.gateway_name(),
    );
    let lines: Vec<OrderLine> = request
        .items
        .iter()
        .map(|item| {
            OrderLine::new(
                order.id,
                item.product_id.clone(),
                item.quantity,
                Price::new(item.price, currency),
            )
        })
        .collect();

    // Order and lines land together or not at all.
    state
        .orders
        .create_order_with_lines(order.clone(), lines)
        .await
        .map_err(shop_error_to_response)?;

    info!(
        "Order {} recorded: {} items, total={}",
        order.id,
        request.items.len(),
        order.total.display()
    );

    let created = match state.gateway.create_gateway_order(&order).await {
        Ok(created) => created,
        Err(e) => {
            // The pending order stays on record without a gateway id; it is
            // recoverable by reconciliation and must not be swallowed.
            error!(
                "Payment initiation failed for order {}: {}",
                order.id, e
            );
            let code = e.status_code();
            return Err((
                StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY),
                Json(
                    ErrorResponse::new(e.to_string(), code).with_details(format!(
                        "Order {} remains pending and awaits reconciliation",
                        order.id
                    )),
                ),
            ));
        }
    };

    state
        .orders
        .attach_gateway_order(order.id, &created.gateway_order_id, created.raw_response)
        .await
        .map_err(shop_error_to_response)?;

    // Clear-on-success policy: the ordered lines leave the cart. A failure
    // here is logged, not fatal; the next reload reconciles.
    let ordered: Vec<String> = request.items.iter().map(|i| i.product_id.clone()).collect();
    if let Err(e) = state.carts.clear_cart_lines(identity.id, &ordered).await {
        warn!("Cart not cleared after order {}: {}", order.id, e);
    }

    info!(
        "Payment initiated: order={}, gateway_order={}",
        order.id, created.gateway_order_id
    );

    Ok(Json(PaymentResponse {
        success: true,
        order_id: Some(order.id),
        gateway_order_id: Some(created.gateway_order_id),
        amount: Some(request.amount),
        currency: Some(request.currency),
        public_key: Some(state.gateway.public_key().to_string()),
        message: Some("Payment initiated successfully".to_string()),
        error: None,
    }))
}

// =============================================================================
// Webhook Receiver
// =============================================================================

/// Handle a payment-status callback from the gateway. Verified against the
/// shared secret when one is configured; fail closed before any mutation.
#[instrument(skip(state, headers, body))]
pub async fn gokwik_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, HandlerError> {
    if let Some(secret) = &state.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                shop_error_to_response(ShopError::WebhookVerificationFailed(
                    "Missing signature header".to_string(),
                ))
            })?;

        verify_signature(secret, &body, signature).map_err(|e| {
            // Potential security event, not just a bad request
            warn!("Webhook rejected: {}", e);
            shop_error_to_response(e)
        })?;
    } else {
        warn!("Webhook signature verification disabled (no secret configured)");
    }

    let notice = parse_payload(&body).map_err(shop_error_to_response)?;
    let next_status = map_payment_status(&notice.payment_status);

    let outcome = state
        .orders
        .apply_payment_update(
            notice.order_id,
            &notice.payment_status,
            &notice.payment_id,
            next_status,
        )
        .await
        .map_err(shop_error_to_response)?;

    let message = match outcome {
        PaymentUpdateOutcome::Applied => {
            info!(
                "Order {} -> {} (payment {})",
                notice.order_id, next_status, notice.payment_id
            );
            "Webhook processed"
        }
        PaymentUpdateOutcome::Duplicate => "Webhook already processed",
        PaymentUpdateOutcome::Stale => {
            warn!(
                "Stale webhook for order {}: status {} ignored",
                notice.order_id, notice.payment_status
            );
            "Order already finalized"
        }
    };

    Ok(Json(WebhookAck {
        success: true,
        message: Some(message.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use async_trait::async_trait;
    use axum_test::TestServer;
    use axum::http::{HeaderName, HeaderValue};
    use shop_core::{
        CartStore, GatewayOrder, Identity, MemoryStore, OrderStatus, OrderStore, PaymentGateway,
        Product, ProductCatalog, ShopResult, StaticIdentityProvider,
    };
    use shop_gokwik::sign_body;
    use std::sync::Arc;

    const TOKEN: &str = "tok-priya";
    const WEBHOOK_SECRET: &str = "whsec_test";

    /// Gateway stub with a programmable outcome
    struct StubGateway {
        fail: bool,
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_gateway_order(&self, _order: &Order) -> ShopResult<GatewayOrder> {
            if self.fail {
                Err(ShopError::Network("gateway unreachable".to_string()))
            } else {
                Ok(GatewayOrder {
                    gateway_order_id: "gw_test_1".to_string(),
                    raw_response: serde_json::json!({ "id": "gw_test_1", "status": "created" }),
                })
            }
        }

        fn gateway_name(&self) -> &'static str {
            "gokwik"
        }

        fn public_key(&self) -> &str {
            "pk_onyx_test"
        }
    }

    struct TestApp {
        server: TestServer,
        store: Arc<MemoryStore>,
        user: Identity,
    }

    fn test_app(gateway_fails: bool) -> TestApp {
        let mut catalog = ProductCatalog::new();
        catalog.add(Product::new(
            "tee-a",
            "Tee A",
            "tees",
            Price::new(100.0, Currency::INR),
        ));
        catalog.add(Product::new(
            "tee-b",
            "Tee B",
            "tees",
            Price::new(50.0, Currency::INR),
        ));

        let store = Arc::new(MemoryStore::new());
        let user = Identity::new(Uuid::new_v4(), "priya@example.com");
        let identity = StaticIdentityProvider::new().with_token(TOKEN, user.clone());

        let state = AppState::with_parts(
            catalog,
            store.clone(),
            Arc::new(identity),
            Arc::new(StubGateway {
                fail: gateway_fails,
            }),
            Some(WEBHOOK_SECRET.to_string()),
        );

        TestApp {
            server: TestServer::new(create_router(state)).unwrap(),
            store,
            user,
        }
    }

    fn payment_request() -> serde_json::Value {
        serde_json::json!({
            "orderId": Uuid::new_v4(),
            "amount": 250.0,
            "currency": "inr",
            "customerName": "Priya Sharma",
            "customerEmail": "priya@example.com",
            "customerPhone": "+91 98450 12345",
            "items": [
                { "productId": "tee-a", "quantity": 2, "price": 100.0 },
                { "productId": "tee-b", "quantity": 1, "price": 50.0 }
            ],
            "shippingAddress": "12 MG Road, Bengaluru, KA 560001"
        })
    }

    fn webhook_body(order_id: Uuid, payment_status: &str, payment_id: &str) -> Vec<u8> {
        serde_json::json!({
            "order_id": order_id,
            "payment_status": payment_status,
            "payment_id": payment_id
        })
        .to_string()
        .into_bytes()
    }

    async fn pending_order_id(app: &TestApp) -> Uuid {
        let response = app
            .server
            .post("/api/v1/payments/initiate")
            .authorization_bearer(TOKEN)
            .json(&payment_request())
            .await;
        response.assert_status_ok();
        response.json::<PaymentResponse>().order_id.unwrap()
    }

    #[tokio::test]
    async fn test_initiate_payment_creates_pending_order() {
        let app = test_app(false);

        let response = app
            .server
            .post("/api/v1/payments/initiate")
            .authorization_bearer(TOKEN)
            .json(&payment_request())
            .await;

        response.assert_status_ok();
        let body = response.json::<PaymentResponse>();
        assert!(body.success);
        assert_eq!(body.gateway_order_id.as_deref(), Some("gw_test_1"));
        assert_eq!(body.public_key.as_deref(), Some("pk_onyx_test"));

        let order = app.store.get_order(body.order_id.unwrap()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total.as_decimal(), 250.0);
        assert_eq!(order.gateway_order_id.as_deref(), Some("gw_test_1"));

        let (_, lines) = app
            .store
            .list_orders(app.user.id)
            .await
            .unwrap()
            .remove(0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price.as_decimal(), 100.0);
        assert_eq!(lines[1].unit_price.as_decimal(), 50.0);
    }

    #[tokio::test]
    async fn test_initiate_payment_requires_auth() {
        let app = test_app(false);

        let response = app
            .server
            .post("/api/v1/payments/initiate")
            .json(&payment_request())
            .await;

        response.assert_status_unauthorized();
        // No order was created
        assert!(app.store.list_orders(app.user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initiate_payment_rejects_mismatched_amount() {
        let app = test_app(false);

        let mut request = payment_request();
        request["amount"] = serde_json::json!(999.0);

        let response = app
            .server
            .post("/api/v1/payments/initiate")
            .authorization_bearer(TOKEN)
            .json(&request)
            .await;

        response.assert_status_bad_request();
        assert!(app.store.list_orders(app.user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_recoverable_pending_order() {
        let app = test_app(true);

        // Seed the cart so we can observe it is untouched on failure
        app.store
            .upsert_cart_line(app.user.id, "tee-a", 2)
            .await
            .unwrap();

        let response = app
            .server
            .post("/api/v1/payments/initiate")
            .authorization_bearer(TOKEN)
            .json(&payment_request())
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let orders = app.store.list_orders(app.user.id).await.unwrap();
        assert_eq!(orders.len(), 1);
        let (order, lines) = &orders[0];
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.gateway_order_id.is_none());
        assert_eq!(lines.len(), 2);

        // Cart untouched on failure
        let cart = app.store.list_cart_lines(app.user.id).await.unwrap();
        assert_eq!(cart.len(), 1);

        // A retried attempt is a separate order, never duplicated lines on
        // the first one
        let retry = app
            .server
            .post("/api/v1/payments/initiate")
            .authorization_bearer(TOKEN)
            .json(&payment_request())
            .await;
        retry.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let orders = app.store.list_orders(app.user.id).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|(_, lines)| lines.len() == 2));
    }

    #[tokio::test]
    async fn test_successful_initiation_clears_ordered_cart_lines() {
        let app = test_app(false);

        app.store
            .upsert_cart_line(app.user.id, "tee-a", 2)
            .await
            .unwrap();
        app.store
            .upsert_cart_line(app.user.id, "hoodie-z", 1)
            .await
            .unwrap();

        pending_order_id(&app).await;

        let cart = app.store.list_cart_lines(app.user.id).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].product_id, "hoodie-z");
    }

    #[tokio::test]
    async fn test_webhook_confirms_and_is_idempotent() {
        let app = test_app(false);
        let order_id = pending_order_id(&app).await;

        let body = webhook_body(order_id, "success", "pay_1");
        let signature = sign_body(WEBHOOK_SECRET, &body);

        let response = app
            .server
            .post("/webhook/gokwik")
            .add_header(
                HeaderName::from_static(SIGNATURE_HEADER),
                HeaderValue::from_str(&signature).unwrap(),
            )
            .bytes(body.clone().into())
            .await;
        response.assert_status_ok();
        assert_eq!(
            app.store.get_order(order_id).await.unwrap().status,
            OrderStatus::Confirmed
        );

        // Identical redelivery converges without a state change
        let redelivery = app
            .server
            .post("/webhook/gokwik")
            .add_header(
                HeaderName::from_static(SIGNATURE_HEADER),
                HeaderValue::from_str(&signature).unwrap(),
            )
            .bytes(body.into())
            .await;
        redelivery.assert_status_ok();
        let ack = redelivery.json::<WebhookAck>();
        assert!(ack.success);
        assert_eq!(
            app.store.get_order(order_id).await.unwrap().status,
            OrderStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_webhook_failure_status_fails_order() {
        let app = test_app(false);
        let order_id = pending_order_id(&app).await;

        let body = webhook_body(order_id, "failed", "pay_2");
        let signature = sign_body(WEBHOOK_SECRET, &body);

        let response = app
            .server
            .post("/webhook/gokwik")
            .add_header(
                HeaderName::from_static(SIGNATURE_HEADER),
                HeaderValue::from_str(&signature).unwrap(),
            )
            .bytes(body.into())
            .await;

        response.assert_status_ok();
        assert_eq!(
            app.store.get_order(order_id).await.unwrap().status,
            OrderStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_webhook_invalid_signature_changes_nothing() {
        let app = test_app(false);
        let order_id = pending_order_id(&app).await;

        let body = webhook_body(order_id, "success", "pay_1");

        let response = app
            .server
            .post("/webhook/gokwik")
            .add_header(
                HeaderName::from_static(SIGNATURE_HEADER),
                HeaderValue::from_static("sha256=deadbeef"),
            )
            .bytes(body.into())
            .await;

        response.assert_status_unauthorized();
        assert_eq!(
            app.store.get_order(order_id).await.unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_webhook_unknown_order_rejected() {
        let app = test_app(false);

        let body = webhook_body(Uuid::new_v4(), "success", "pay_1");
        let signature = sign_body(WEBHOOK_SECRET, &body);

        let response = app
            .server
            .post("/webhook/gokwik")
            .add_header(
                HeaderName::from_static(SIGNATURE_HEADER),
                HeaderValue::from_str(&signature).unwrap(),
            )
            .bytes(body.into())
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_webhook_missing_order_id_is_bad_request() {
        let app = test_app(false);

        let body = serde_json::json!({
            "payment_status": "success",
            "payment_id": "pay_1"
        })
        .to_string()
        .into_bytes();
        let signature = sign_body(WEBHOOK_SECRET, &body);

        let response = app
            .server
            .post("/webhook/gokwik")
            .add_header(
                HeaderName::from_static(SIGNATURE_HEADER),
                HeaderValue::from_str(&signature).unwrap(),
            )
            .bytes(body.into())
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_add_cart_item_increments_existing_line() {
        let app = test_app(false);

        for _ in 0..2 {
            let response = app
                .server
                .post("/api/v1/cart/items")
                .authorization_bearer(TOKEN)
                .json(&serde_json::json!({ "product_id": "tee-a" }))
                .await;
            response.assert_status_ok();
        }

        let cart = app.store.list_cart_lines(app.user.id).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_order_history_includes_lines_and_snapshot() {
        let app = test_app(false);
        let order_id = pending_order_id(&app).await;

        let response = app
            .server
            .get("/api/v1/orders")
            .authorization_bearer(TOKEN)
            .await;

        response.assert_status_ok();
        let history = response.json::<serde_json::Value>();
        assert_eq!(history[0]["id"], serde_json::json!(order_id));
        assert_eq!(history[0]["lines"].as_array().unwrap().len(), 2);
        assert_eq!(history[0]["lines"][0]["product"]["name"], "Tee A");
    }
}
