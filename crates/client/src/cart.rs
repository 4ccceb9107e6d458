//! Cart state container mirroring the remote cart.
//!
//! Holds an ordered list of line items. Mutations go remote-first: the
//! local copy only changes after the server accepted the change, except
//! that `add_item` increments an existing line by the *requested* amount
//! rather than waiting for the server's authoritative quantity. Totals are
//! summed from server-computed line totals, never recomputed from unit
//! price and quantity, so server-side pricing rules cannot drift.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use sprout_core::{CartItemId, Price, ProductStockId};
use tracing::instrument;

use crate::api::ApiClient;
use crate::api::types::CartItem;
use crate::error::Result;
use crate::sync::SyncState;

/// Client-side mirror of the remote cart.
///
/// Cheap to clone; clones share one collection.
#[derive(Clone)]
pub struct CartSynchronizer {
    inner: Arc<CartInner>,
}

struct CartInner {
    api: ApiClient,
    items: RwLock<Vec<CartItem>>,
    loading: AtomicBool,
    sync_state: RwLock<SyncState>,
}

impl CartSynchronizer {
    /// Create an empty cart mirror.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(CartInner {
                api,
                items: RwLock::new(Vec::new()),
                loading: AtomicBool::new(false),
                sync_state: RwLock::new(SyncState::Synced),
            }),
        }
    }

    /// Replace the local collection with the remote cart's current items.
    ///
    /// Best-effort: failures are logged and swallowed so startup never
    /// fails because the cart could not load. The loading flag reports
    /// status only; re-entrant calls are not prevented.
    #[instrument(skip(self))]
    pub async fn load(&self) {
        self.inner.loading.store(true, Ordering::SeqCst);
        match self.inner.api.current_cart().await {
            Ok(payload) => {
                *self.write_items() = payload.items;
                self.set_sync_state(SyncState::Synced);
            }
            Err(error) => {
                tracing::error!(%error, "Cart load failed");
            }
        }
        self.inner.loading.store(false, Ordering::SeqCst);
    }

    /// Add `quantity` of a product stock to the cart.
    ///
    /// Remote-first; on success an existing line for the same stock is
    /// incremented by the requested amount, otherwise the server-returned
    /// line is appended verbatim.
    ///
    /// # Errors
    ///
    /// Returns the remote error unchanged; the local collection is not
    /// touched on failure.
    #[instrument(skip(self), fields(stock_id = %stock_id, quantity))]
    pub async fn add_item(&self, stock_id: ProductStockId, quantity: u32) -> Result<()> {
        let created = self.inner.api.add_cart_item(stock_id, quantity).await?;

        let mut items = self.write_items();
        if let Some(existing) = items
            .iter_mut()
            .find(|item| item.product_stock.id == stock_id)
        {
            existing.quantity += quantity;
        } else {
            items.push(created);
        }
        Ok(())
    }

    /// Set a line's quantity. A quantity of zero removes the line instead;
    /// items with quantity 0 are never retained.
    ///
    /// Remote-first; on remote failure the local line is left stale, the
    /// failure is logged, and the collection is marked [`SyncState::Diverged`].
    #[instrument(skip(self), fields(item_id = %item_id, quantity))]
    pub async fn update_item(&self, item_id: CartItemId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(item_id).await;
            return;
        }

        self.set_sync_state(SyncState::PendingRemote);
        match self.inner.api.update_cart_item(item_id, quantity).await {
            Ok(()) => {
                let mut items = self.write_items();
                if let Some(item) = items.iter_mut().find(|item| item.id == item_id) {
                    item.quantity = quantity;
                }
                drop(items);
                self.set_sync_state(SyncState::Synced);
            }
            Err(error) => {
                tracing::error!(%error, item_id = %item_id, "Cart item update failed");
                self.set_sync_state(SyncState::Diverged);
            }
        }
    }

    /// Remove a line from the cart.
    ///
    /// Remote-first; same stale-on-failure policy as [`Self::update_item`].
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_item(&self, item_id: CartItemId) {
        self.set_sync_state(SyncState::PendingRemote);
        match self.inner.api.remove_cart_item(item_id).await {
            Ok(()) => {
                self.write_items().retain(|item| item.id != item_id);
                self.set_sync_state(SyncState::Synced);
            }
            Err(error) => {
                tracing::error!(%error, item_id = %item_id, "Cart item removal failed");
                self.set_sync_state(SyncState::Diverged);
            }
        }
    }

    /// Empty the local collection without notifying the remote cart.
    ///
    /// Deliberately asymmetric: no delete calls are issued. Used after
    /// checkout, where the server empties its side on its own.
    pub fn clear(&self) {
        self.write_items().clear();
    }

    /// Merge the anonymous cart into the authenticated one server-side,
    /// then reload.
    ///
    /// # Errors
    ///
    /// Returns an error if the merge request fails; the reload afterwards
    /// is best-effort.
    pub async fn merge(&self) -> Result<()> {
        self.inner.api.merge_cart().await?;
        self.load().await;
        Ok(())
    }

    /// Snapshot of the current line items.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.read_items().clone()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.read_items().iter().map(|item| item.quantity).sum()
    }

    /// Sum of the server-computed line totals.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.read_items().iter().map(CartItem::line_total).sum()
    }

    /// Whether a load is in flight (status only).
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// Whether the local copy is known to match the remote cart.
    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        *self
            .inner
            .sync_state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_sync_state(&self, state: SyncState) {
        *self
            .inner
            .sync_state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn read_items(&self) -> std::sync::RwLockReadGuard<'_, Vec<CartItem>> {
        self.inner
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_items(&self) -> std::sync::RwLockWriteGuard<'_, Vec<CartItem>> {
        self.inner
            .items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
