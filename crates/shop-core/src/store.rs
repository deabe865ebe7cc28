//! # Persistence Contracts
//!
//! Traits over the hosted datastore plus an in-memory implementation used by
//! the server and tests. Row-level access control is the datastore's concern;
//! these contracts are already scoped by user id.

use crate::cart::CartLine;
use crate::error::{ShopError, ShopResult};
use crate::order::{Order, OrderLine, OrderStatus};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Per-user cart line persistence
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Insert or replace the line for (user, product) with the given quantity.
    /// Quantity must be >= 1; a zero-quantity line is deleted, never stored.
    async fn upsert_cart_line(&self, user_id: Uuid, product_id: &str, quantity: u32)
        -> ShopResult<()>;

    async fn delete_cart_line(&self, user_id: Uuid, product_id: &str) -> ShopResult<()>;

    async fn list_cart_lines(&self, user_id: Uuid) -> ShopResult<Vec<CartLine>>;

    /// Delete the user's lines for the given products (cart clearing after a
    /// successful payment initiation).
    async fn clear_cart_lines(&self, user_id: Uuid, product_ids: &[String]) -> ShopResult<()>;
}

/// Per-user wishlist membership persistence
#[async_trait]
pub trait WishlistStore: Send + Sync {
    async fn add_wishlist_entry(&self, user_id: Uuid, product_id: &str) -> ShopResult<()>;
    async fn remove_wishlist_entry(&self, user_id: Uuid, product_id: &str) -> ShopResult<()>;
    async fn list_wishlist(&self, user_id: Uuid) -> ShopResult<Vec<String>>;
}

/// Outcome of applying a webhook payment update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentUpdateOutcome {
    /// The order transitioned to the new status
    Applied,
    /// This payment id was already applied; state unchanged (idempotent)
    Duplicate,
    /// The order is past the requested transition; state unchanged
    Stale,
}

/// Order persistence
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order and all of its lines as one atomic write. Either the
    /// order exists with every line, or nothing was written.
    async fn create_order_with_lines(&self, order: Order, lines: Vec<OrderLine>) -> ShopResult<()>;

    /// Record the gateway-side order id and raw response after a successful
    /// payment initiation.
    async fn attach_gateway_order(
        &self,
        order_id: Uuid,
        gateway_order_id: &str,
        raw_response: serde_json::Value,
    ) -> ShopResult<()>;

    /// Apply a webhook payment update. Deduplicates by payment id: re-delivery
    /// of an already-applied payment id converges without a state change.
    async fn apply_payment_update(
        &self,
        order_id: Uuid,
        payment_status: &str,
        payment_id: &str,
        new_status: OrderStatus,
    ) -> ShopResult<PaymentUpdateOutcome>;

    async fn get_order(&self, order_id: Uuid) -> ShopResult<Order>;

    /// Orders for a user, newest first, with line snapshots
    async fn list_orders(&self, user_id: Uuid) -> ShopResult<Vec<(Order, Vec<OrderLine>)>>;
}

#[derive(Default)]
struct MemoryInner {
    // user -> product -> quantity, insertion-ordered per user via Vec
    cart: HashMap<Uuid, Vec<(String, u32)>>,
    wishlist: HashMap<Uuid, BTreeSet<String>>,
    orders: HashMap<Uuid, Order>,
    order_lines: HashMap<Uuid, Vec<OrderLine>>,
}

/// In-memory datastore. A single `RwLock` write guard is the transactional
/// boundary: `create_order_with_lines` inserts the order and its lines under
/// one guard, so no reader can observe an order without lines.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn upsert_cart_line(
        &self,
        user_id: Uuid,
        product_id: &str,
        quantity: u32,
    ) -> ShopResult<()> {
        if quantity == 0 {
            return self.delete_cart_line(user_id, product_id).await;
        }
        let mut inner = self.inner.write().await;
        let lines = inner.cart.entry(user_id).or_default();
        match lines.iter_mut().find(|(pid, _)| pid == product_id) {
            Some((_, qty)) => *qty = quantity,
            None => lines.push((product_id.to_string(), quantity)),
        }
        Ok(())
    }

    async fn delete_cart_line(&self, user_id: Uuid, product_id: &str) -> ShopResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(lines) = inner.cart.get_mut(&user_id) {
            lines.retain(|(pid, _)| pid != product_id);
        }
        Ok(())
    }

    async fn list_cart_lines(&self, user_id: Uuid) -> ShopResult<Vec<CartLine>> {
        let inner = self.inner.read().await;
        Ok(inner
            .cart
            .get(&user_id)
            .map(|lines| {
                lines
                    .iter()
                    .map(|(pid, qty)| CartLine {
                        user_id,
                        product_id: pid.clone(),
                        quantity: *qty,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn clear_cart_lines(&self, user_id: Uuid, product_ids: &[String]) -> ShopResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(lines) = inner.cart.get_mut(&user_id) {
            lines.retain(|(pid, _)| !product_ids.contains(pid));
        }
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn add_wishlist_entry(&self, user_id: Uuid, product_id: &str) -> ShopResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .wishlist
            .entry(user_id)
            .or_default()
            .insert(product_id.to_string());
        Ok(())
    }

    async fn remove_wishlist_entry(&self, user_id: Uuid, product_id: &str) -> ShopResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(set) = inner.wishlist.get_mut(&user_id) {
            set.remove(product_id);
        }
        Ok(())
    }

    async fn list_wishlist(&self, user_id: Uuid) -> ShopResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .wishlist
            .get(&user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order_with_lines(&self, order: Order, lines: Vec<OrderLine>) -> ShopResult<()> {
        if lines.is_empty() {
            return Err(ShopError::Validation("Order has no line items".to_string()));
        }
        if lines.iter().any(|l| l.order_id != order.id) {
            return Err(ShopError::Internal(
                "Order line does not reference its order".to_string(),
            ));
        }
        let mut inner = self.inner.write().await;
        if inner.orders.contains_key(&order.id) {
            return Err(ShopError::Storage(format!(
                "Order already exists: {}",
                order.id
            )));
        }
        inner.order_lines.insert(order.id, lines);
        inner.orders.insert(order.id, order);
        Ok(())
    }

    async fn attach_gateway_order(
        &self,
        order_id: Uuid,
        gateway_order_id: &str,
        raw_response: serde_json::Value,
    ) -> ShopResult<()> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| ShopError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        order.gateway_order_id = Some(gateway_order_id.to_string());
        order.gateway_response = Some(raw_response);
        Ok(())
    }

    async fn apply_payment_update(
        &self,
        order_id: Uuid,
        payment_status: &str,
        payment_id: &str,
        new_status: OrderStatus,
    ) -> ShopResult<PaymentUpdateOutcome> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| ShopError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        if order.payment_id.as_deref() == Some(payment_id) {
            return Ok(PaymentUpdateOutcome::Duplicate);
        }
        if !order.status.can_transition_to(new_status) {
            return Ok(PaymentUpdateOutcome::Stale);
        }

        order.status = new_status;
        order.payment_status = payment_status.to_string();
        order.payment_id = Some(payment_id.to_string());
        Ok(PaymentUpdateOutcome::Applied)
    }

    async fn get_order(&self, order_id: Uuid) -> ShopResult<Order> {
        let inner = self.inner.read().await;
        inner
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| ShopError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    async fn list_orders(&self, user_id: Uuid) -> ShopResult<Vec<(Order, Vec<OrderLine>)>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<(Order, Vec<OrderLine>)> = inner
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .map(|o| {
                (
                    o.clone(),
                    inner.order_lines.get(&o.id).cloned().unwrap_or_default(),
                )
            })
            .collect();
        orders.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));
        Ok(orders)
    }
}
