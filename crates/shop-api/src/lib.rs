//! # shop-api
//!
//! HTTP API layer for onyx-shop.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for the catalog, cart, wishlist, and orders
//! - The payment gateway bridge endpoint
//! - Webhook receiver for gateway payment-status callbacks
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/products` | List products |
//! | GET | `/api/v1/products/:id` | Get product |
//! | GET | `/api/v1/cart` | The signed-in user's cart |
//! | POST | `/api/v1/cart/items` | Add to cart |
//! | PUT | `/api/v1/cart/items/:id` | Set line quantity |
//! | DELETE | `/api/v1/cart/items/:id` | Remove a line |
//! | GET | `/api/v1/wishlist` | The signed-in user's wishlist |
//! | POST | `/api/v1/wishlist/toggle` | Flip wishlist membership |
//! | GET | `/api/v1/orders` | Order history |
//! | GET | `/api/v1/orders/:id` | A single order |
//! | POST | `/api/v1/payments/initiate` | Payment gateway bridge |
//! | POST | `/webhook/gokwik` | Gokwik webhook |

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
