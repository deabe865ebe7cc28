//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Catalog:
///   - GET  /api/v1/products - List active products (?category= filter)
///   - GET  /api/v1/products/{id} - Get product by ID
///
/// - Cart & wishlist (bearer auth):
///   - GET    /api/v1/cart - The signed-in user's cart
///   - POST   /api/v1/cart/items - Add a product (increments existing line)
///   - PUT    /api/v1/cart/items/{product_id} - Set quantity (0 deletes)
///   - DELETE /api/v1/cart/items/{product_id} - Remove a line
///   - GET    /api/v1/wishlist - The signed-in user's wishlist
///   - POST   /api/v1/wishlist/toggle - Flip wishlist membership
///
/// - Orders & payments (bearer auth):
///   - GET  /api/v1/orders - Order history, newest first
///   - GET  /api/v1/orders/{order_id} - A single order with its lines
///   - POST /api/v1/payments/initiate - Payment gateway bridge
///
/// - Webhooks:
///   - POST /webhook/gokwik - Gokwik payment-status callback
pub fn create_router(state: AppState) -> Router {
    // CORS: the storefront is served from a separate origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Catalog
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        // Cart
        .route("/cart", get(handlers::get_cart))
        .route("/cart/items", post(handlers::add_cart_item))
        .route(
            "/cart/items/{product_id}",
            put(handlers::update_cart_item).delete(handlers::remove_cart_item),
        )
        // Wishlist
        .route("/wishlist", get(handlers::get_wishlist))
        .route("/wishlist/toggle", post(handlers::toggle_wishlist))
        // Orders
        .route("/orders", get(handlers::list_orders))
        .route("/orders/{order_id}", get(handlers::get_order))
        // Payment gateway bridge
        .route("/payments/initiate", post(handlers::initiate_payment));

    // Webhook routes (no CORS, must accept raw body)
    let webhook_routes = Router::new().route("/gokwik", post(handlers::gokwik_webhook));

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // API v1
        .nest("/api/v1", api_routes)
        // Webhooks
        .nest("/webhook", webhook_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
