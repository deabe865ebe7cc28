//! # Cart State
//!
//! The signed-in visitor's cart, wishlist, and compare-set view. Mutations
//! apply locally first and then persist; each one reports whether the remote
//! write was confirmed, so callers can reconcile instead of diverging
//! silently.

use crate::error::{ShopError, ShopResult};
use crate::identity::Identity;
use crate::product::{Currency, Price, Product, ProductCatalog};
use crate::store::{CartStore, WishlistStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Maximum number of products in the compare set
pub const COMPARE_CAP: usize = 4;

/// A persisted cart row: one (user, product) quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub user_id: Uuid,
    pub product_id: String,
    pub quantity: u32,
}

/// A cart entry as the session sees it: the product plus a quantity
#[derive(Debug, Clone, Serialize)]
pub struct SessionLine {
    pub product: Product,
    pub quantity: u32,
}

impl SessionLine {
    pub fn total(&self) -> Price {
        let unit = self.product.effective_price();
        Price::from_minor(unit.amount * self.quantity as i64, unit.currency)
    }
}

/// Whether a mutation reached the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local state and the remote store agree
    Persisted,
    /// Applied locally; the remote write failed and should be reconciled
    LocalOnly { reason: String },
}

/// A visitor's cart/wishlist/compare session.
///
/// Local state is authoritative for display; the store holds the durable
/// per-user rows. `reload` re-reads the store and is invoked on sign-in.
pub struct CartSession {
    identity: Option<Identity>,
    lines: Vec<SessionLine>,
    wishlist: Vec<String>,
    compare: Vec<String>,
    cart_store: Arc<dyn CartStore>,
    wishlist_store: Arc<dyn WishlistStore>,
}

impl CartSession {
    pub fn new(cart_store: Arc<dyn CartStore>, wishlist_store: Arc<dyn WishlistStore>) -> Self {
        Self {
            identity: None,
            lines: Vec::new(),
            wishlist: Vec::new(),
            compare: Vec::new(),
            cart_store,
            wishlist_store,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn lines(&self) -> &[SessionLine] {
        &self.lines
    }

    pub fn wishlist(&self) -> &[String] {
        &self.wishlist
    }

    pub fn compare(&self) -> &[String] {
        &self.compare
    }

    fn require_identity(&self) -> ShopResult<Uuid> {
        self.identity
            .as_ref()
            .map(|id| id.id)
            .ok_or_else(|| ShopError::AuthRequired("Sign in to manage your cart".to_string()))
    }

    /// Add one unit of a product. An existing line is incremented; otherwise a
    /// new line with quantity 1 is inserted. Requires a signed-in identity and
    /// performs no store call without one.
    pub async fn add_to_cart(&mut self, product: &Product) -> ShopResult<SyncOutcome> {
        let user_id = self.require_identity()?;

        let quantity = match self.lines.iter_mut().find(|l| l.product.id == product.id) {
            Some(line) => {
                line.quantity += 1;
                line.quantity
            }
            None => {
                self.lines.push(SessionLine {
                    product: product.clone(),
                    quantity: 1,
                });
                1
            }
        };

        self.persist_line(user_id, &product.id, quantity).await
    }

    /// Set a line's quantity. Zero is equivalent to `remove_item`.
    pub async fn update_quantity(
        &mut self,
        product_id: &str,
        quantity: u32,
    ) -> ShopResult<SyncOutcome> {
        if quantity == 0 {
            return self.remove_item(product_id).await;
        }
        let user_id = self.require_identity()?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product.id == product_id)
            .ok_or_else(|| ShopError::ProductNotFound {
                product_id: product_id.to_string(),
            })?;
        line.quantity = quantity;

        self.persist_line(user_id, product_id, quantity).await
    }

    /// Delete a line locally and request remote deletion
    pub async fn remove_item(&mut self, product_id: &str) -> ShopResult<SyncOutcome> {
        let user_id = self.require_identity()?;
        self.lines.retain(|l| l.product.id != product_id);

        match self.cart_store.delete_cart_line(user_id, product_id).await {
            Ok(()) => Ok(SyncOutcome::Persisted),
            Err(e) => {
                warn!("Cart line delete not persisted: {}", e);
                Ok(SyncOutcome::LocalOnly {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Flip wishlist membership for a product
    pub async fn toggle_wishlist(&mut self, product: &Product) -> ShopResult<SyncOutcome> {
        let user_id = self.require_identity()?;

        let present = self.wishlist.iter().any(|id| id == &product.id);
        let result = if present {
            self.wishlist.retain(|id| id != &product.id);
            self.wishlist_store
                .remove_wishlist_entry(user_id, &product.id)
                .await
        } else {
            self.wishlist.push(product.id.clone());
            self.wishlist_store
                .add_wishlist_entry(user_id, &product.id)
                .await
        };

        match result {
            Ok(()) => Ok(SyncOutcome::Persisted),
            Err(e) => {
                warn!("Wishlist toggle not persisted: {}", e);
                Ok(SyncOutcome::LocalOnly {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Flip compare membership. The set holds the most recent four additions;
    /// a fifth distinct product evicts the oldest. Session-local only.
    pub fn toggle_compare(&mut self, product: &Product) {
        if self.compare.iter().any(|id| id == &product.id) {
            self.compare.retain(|id| id != &product.id);
            return;
        }
        self.compare.push(product.id.clone());
        if self.compare.len() > COMPARE_CAP {
            self.compare.remove(0);
        }
    }

    pub fn is_in_wishlist(&self, product_id: &str) -> bool {
        self.wishlist.iter().any(|id| id == product_id)
    }

    pub fn is_in_compare(&self, product_id: &str) -> bool {
        self.compare.iter().any(|id| id == product_id)
    }

    /// Sign in and replace any anonymous state with the user's persisted rows
    pub async fn sign_in(&mut self, identity: Identity, catalog: &ProductCatalog) -> ShopResult<()> {
        self.identity = Some(identity);
        self.reload(catalog).await
    }

    /// Clear cart state; no anonymous cart persists across sign-out
    pub fn sign_out(&mut self) {
        self.identity = None;
        self.lines.clear();
        self.wishlist.clear();
    }

    /// Reconciliation step: re-read persisted rows, rehydrating products from
    /// the catalog. Rows whose product has left the catalog are dropped.
    pub async fn reload(&mut self, catalog: &ProductCatalog) -> ShopResult<()> {
        let user_id = self.require_identity()?;

        let rows = self.cart_store.list_cart_lines(user_id).await?;
        self.lines = rows
            .into_iter()
            .filter_map(|row| {
                catalog.get(&row.product_id).map(|product| SessionLine {
                    product: product.clone(),
                    quantity: row.quantity,
                })
            })
            .collect();

        self.wishlist = self.wishlist_store.list_wishlist(user_id).await?;
        Ok(())
    }

    /// Cart total over effective unit prices (derived, never stored)
    pub fn total(&self) -> Price {
        let currency = self
            .lines
            .first()
            .map(|l| l.product.price.currency)
            .unwrap_or(Currency::INR);
        let amount: i64 = self.lines.iter().map(|l| l.total().amount).sum();
        Price::from_minor(amount, currency)
    }

    /// Total unit count for the navigation badge
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn wishlist_count(&self) -> usize {
        self.wishlist.len()
    }

    async fn persist_line(
        &self,
        user_id: Uuid,
        product_id: &str,
        quantity: u32,
    ) -> ShopResult<SyncOutcome> {
        match self
            .cart_store
            .upsert_cart_line(user_id, product_id, quantity)
            .await
        {
            Ok(()) => Ok(SyncOutcome::Persisted),
            Err(e) => {
                warn!("Cart line upsert not persisted: {}", e);
                Ok(SyncOutcome::LocalOnly {
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn product(id: &str, price: f64) -> Product {
        Product::new(id, id.to_uppercase(), "tees", Price::new(price, Currency::INR))
    }

    fn identity() -> Identity {
        Identity::new(Uuid::new_v4(), "priya@example.com")
    }

    async fn signed_in_session(store: Arc<MemoryStore>) -> CartSession {
        let mut session = CartSession::new(store.clone(), store);
        session
            .sign_in(identity(), &ProductCatalog::new())
            .await
            .unwrap();
        session
    }

    /// Store that counts calls and fails every write
    #[derive(Default)]
    struct UnreachableStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CartStore for UnreachableStore {
        async fn upsert_cart_line(&self, _: Uuid, _: &str, _: u32) -> ShopResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ShopError::Storage("connection refused".to_string()))
        }
        async fn delete_cart_line(&self, _: Uuid, _: &str) -> ShopResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ShopError::Storage("connection refused".to_string()))
        }
        async fn list_cart_lines(&self, _: Uuid) -> ShopResult<Vec<CartLine>> {
            Ok(Vec::new())
        }
        async fn clear_cart_lines(&self, _: Uuid, _: &[String]) -> ShopResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl WishlistStore for UnreachableStore {
        async fn add_wishlist_entry(&self, _: Uuid, _: &str) -> ShopResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ShopError::Storage("connection refused".to_string()))
        }
        async fn remove_wishlist_entry(&self, _: Uuid, _: &str) -> ShopResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ShopError::Storage("connection refused".to_string()))
        }
        async fn list_wishlist(&self, _: Uuid) -> ShopResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_add_twice_increments_single_line() {
        let store = Arc::new(MemoryStore::new());
        let mut session = signed_in_session(store).await;
        let tee = product("tee-a", 899.0);

        session.add_to_cart(&tee).await.unwrap();
        session.add_to_cart(&tee).await.unwrap();

        assert_eq!(session.lines().len(), 1);
        assert_eq!(session.lines()[0].quantity, 2);
        assert_eq!(session.item_count(), 2);
    }

    #[tokio::test]
    async fn test_unauthenticated_add_performs_no_store_call() {
        let store = Arc::new(UnreachableStore::default());
        let mut session = CartSession::new(store.clone(), store.clone());

        let err = session.add_to_cart(&product("tee-a", 899.0)).await.unwrap_err();
        assert!(matches!(err, ShopError::AuthRequired(_)));
        assert!(session.lines().is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_zero_equals_remove() {
        let store = Arc::new(MemoryStore::new());
        let mut a = signed_in_session(store.clone()).await;
        let tee = product("tee-a", 899.0);

        a.add_to_cart(&tee).await.unwrap();
        a.update_quantity("tee-a", 0).await.unwrap();

        let mut b = signed_in_session(store).await;
        b.add_to_cart(&tee).await.unwrap();
        b.remove_item("tee-a").await.unwrap();

        assert!(a.lines().is_empty());
        assert!(b.lines().is_empty());
        assert_eq!(a.item_count(), b.item_count());
    }

    #[tokio::test]
    async fn test_compare_cap_evicts_oldest() {
        let store = Arc::new(MemoryStore::new());
        let mut session = CartSession::new(store.clone(), store);

        for id in ["a", "b", "c", "d", "e"] {
            session.toggle_compare(&product(id, 500.0));
        }

        assert_eq!(session.compare().len(), COMPARE_CAP);
        assert!(!session.is_in_compare("a"));
        assert_eq!(session.compare(), &["b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_store_failure_reports_local_only() {
        let store = Arc::new(UnreachableStore::default());
        let mut session = CartSession::new(store.clone(), store.clone());
        session.identity = Some(identity());

        let outcome = session.add_to_cart(&product("tee-a", 899.0)).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::LocalOnly { .. }));
        // The optimistic local state is kept
        assert_eq!(session.item_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_reloads_and_sign_out_clears() {
        let store = Arc::new(MemoryStore::new());
        let user = identity();
        store
            .upsert_cart_line(user.id, "tee-a", 2)
            .await
            .unwrap();
        store.add_wishlist_entry(user.id, "hoodie-z").await.unwrap();

        let mut catalog = ProductCatalog::new();
        catalog.add(product("tee-a", 899.0));

        let mut session = CartSession::new(store.clone(), store);
        session.sign_in(user, &catalog).await.unwrap();

        assert_eq!(session.item_count(), 2);
        assert!(session.is_in_wishlist("hoodie-z"));

        session.sign_out();
        assert!(session.lines().is_empty());
        assert_eq!(session.wishlist_count(), 0);
        assert!(session.identity().is_none());
    }

    #[tokio::test]
    async fn test_reload_drops_rows_missing_from_catalog() {
        let store = Arc::new(MemoryStore::new());
        let user = identity();
        store.upsert_cart_line(user.id, "retired-sku", 1).await.unwrap();
        store.upsert_cart_line(user.id, "tee-a", 1).await.unwrap();

        let mut catalog = ProductCatalog::new();
        catalog.add(product("tee-a", 899.0));

        let mut session = CartSession::new(store.clone(), store);
        session.sign_in(user, &catalog).await.unwrap();

        assert_eq!(session.lines().len(), 1);
        assert_eq!(session.lines()[0].product.id, "tee-a");
    }

    #[tokio::test]
    async fn test_total_uses_effective_prices() {
        let store = Arc::new(MemoryStore::new());
        let mut session = signed_in_session(store).await;

        let discounted = product("tee-a", 1000.0).with_discount(10);
        session.add_to_cart(&discounted).await.unwrap();
        session.add_to_cart(&discounted).await.unwrap();
        session.add_to_cart(&product("tee-b", 50.0)).await.unwrap();

        assert_eq!(session.total().as_decimal(), 1850.0);
    }
}
