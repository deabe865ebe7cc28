//! # shop-core
//!
//! Core types and traits for the onyx-shop storefront.
//!
//! This crate provides:
//! - `Product` and `ProductCatalog` for the product catalog
//! - `CartSession` for the visitor's cart/wishlist/compare state
//! - `Order`, `OrderLine`, and the order status lifecycle
//! - `CheckoutFlow` for the order submission state machine
//! - `PaymentGateway` and `PaymentBridge` traits at the payment seams
//! - `CartStore`/`WishlistStore`/`OrderStore` persistence contracts with an
//!   in-memory implementation
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{CartSession, CartSnapshot, CheckoutFlow, ShippingAddress};
//!
//! // Add products to the signed-in session
//! session.add_to_cart(&product).await?;
//!
//! // Capture the cart and submit
//! let snapshot = CartSnapshot::from_lines(session.lines());
//! let mut flow = CheckoutFlow::new();
//! let response = flow.submit(session.identity(), &snapshot, &address, &bridge).await?;
//!
//! // Redirect the visitor using response.gateway_order_id / public_key
//! ```

pub mod cart;
pub mod checkout;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod order;
pub mod product;
pub mod store;

// Re-exports for convenience
pub use cart::{CartLine, CartSession, SessionLine, SyncOutcome, COMPARE_CAP};
pub use checkout::{
    CartSnapshot, CheckoutFlow, CheckoutState, PaymentBridge, PaymentItem, PaymentRequest,
    PaymentResponse, ShippingAddress, SnapshotItem,
};
pub use error::{ShopError, ShopResult};
pub use gateway::{BoxedPaymentGateway, GatewayOrder, PaymentGateway};
pub use identity::{Identity, IdentityProvider, StaticIdentityProvider};
pub use order::{Order, OrderLine, OrderLineDetail, OrderStatus, OrderWithLines};
pub use product::{Currency, Price, Product, ProductCatalog};
pub use store::{CartStore, MemoryStore, OrderStore, PaymentUpdateOutcome, WishlistStore};
