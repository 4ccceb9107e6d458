//! Favorites state container with a durable local cache.
//!
//! Dual-mode: while authenticated the remote favorites list is the source
//! of truth; while anonymous the local cache is. The collection has set
//! semantics keyed on product id but is stored as an ordered sequence, and
//! every mutation writes the full collection back to durable storage under
//! the `favorites` key.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use sprout_core::ProductId;
use tracing::instrument;

use crate::api::ApiClient;
use crate::api::types::{Product, ToggleStatus};
use crate::session::TokenStore;
use crate::storage::{FAVORITES_KEY, LocalStore};
use crate::sync::SyncState;

/// What a toggle call is aimed at: a bare id, or the full product record.
///
/// With only an id, the product cannot be inserted locally on the "added"
/// path; membership removal still works either way.
#[derive(Debug, Clone)]
pub enum FavoriteTarget {
    Id(ProductId),
    Product(Box<Product>),
}

impl FavoriteTarget {
    const fn id(&self) -> ProductId {
        match self {
            Self::Id(id) => *id,
            Self::Product(product) => product.id,
        }
    }

    fn into_product(self) -> Option<Product> {
        match self {
            Self::Id(_) => None,
            Self::Product(product) => Some(*product),
        }
    }
}

impl From<ProductId> for FavoriteTarget {
    fn from(id: ProductId) -> Self {
        Self::Id(id)
    }
}

impl From<Product> for FavoriteTarget {
    fn from(product: Product) -> Self {
        Self::Product(Box::new(product))
    }
}

impl From<&Product> for FavoriteTarget {
    fn from(product: &Product) -> Self {
        Self::Product(Box::new(product.clone()))
    }
}

/// Client-side favorites collection, cached in durable local storage.
///
/// Cheap to clone; clones share one collection.
#[derive(Clone)]
pub struct FavoritesSynchronizer {
    inner: Arc<FavoritesInner>,
}

struct FavoritesInner {
    api: ApiClient,
    tokens: TokenStore,
    store: LocalStore,
    items: RwLock<Vec<Product>>,
    loading: AtomicBool,
    sync_state: RwLock<SyncState>,
}

impl FavoritesSynchronizer {
    /// Create the favorites container, seeding the collection from the
    /// durable cache. Malformed cached data resets to empty with a
    /// warning; it never crashes startup.
    #[must_use]
    pub fn new(api: ApiClient, tokens: TokenStore, store: LocalStore) -> Self {
        let items = store
            .get(FAVORITES_KEY)
            .map_or_else(Vec::new, |raw| {
                serde_json::from_str::<Vec<Product>>(&raw).unwrap_or_else(|error| {
                    tracing::warn!(%error, "Malformed favorites cache, resetting to empty");
                    Vec::new()
                })
            });

        Self {
            inner: Arc::new(FavoritesInner {
                api,
                tokens,
                store,
                items: RwLock::new(items),
                loading: AtomicBool::new(false),
                sync_state: RwLock::new(SyncState::Synced),
            }),
        }
    }

    /// Membership test by product id.
    #[must_use]
    pub fn is_favorite(&self, id: ProductId) -> bool {
        self.read_items().iter().any(|item| item.id == id)
    }

    /// Add a product locally (no remote call). Returns `false` if it was
    /// already present. Persists on change.
    pub fn add_favorite(&self, product: &Product) -> bool {
        {
            let mut items = self.write_items();
            if items.iter().any(|item| item.id == product.id) {
                return false;
            }
            items.push(product.clone());
        }
        self.persist();
        true
    }

    /// Remove a product locally by id (no remote call). Returns `false`
    /// if it was not present. Persists on change.
    pub fn remove_favorite(&self, id: ProductId) -> bool {
        let removed = {
            let mut items = self.write_items();
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        };
        if removed {
            self.persist();
        }
        removed
    }

    /// Flip a product's favorite state.
    ///
    /// Authenticated: the remote toggle endpoint decides, and the local
    /// collection follows the reported result. If the remote call fails,
    /// the local collection is flipped to the opposite of its pre-call
    /// membership anyway and marked [`SyncState::Diverged`] — the attempted
    /// direction is assumed to be the intended outcome.
    ///
    /// Anonymous: the local collection is flipped directly, no remote call.
    #[instrument(skip(self, target))]
    pub async fn toggle_favorite(&self, target: impl Into<FavoriteTarget>) {
        let target = target.into();
        let id = target.id();
        let was_favorite = self.is_favorite(id);

        if !self.inner.tokens.is_authenticated() {
            self.apply_local_toggle(was_favorite, id, target.into_product());
            return;
        }

        match self.inner.api.toggle_favorite(id).await {
            Ok(outcome) => {
                match outcome.status {
                    ToggleStatus::Added => {
                        if let Some(product) = target.into_product() {
                            self.add_favorite(&product);
                        }
                    }
                    ToggleStatus::Removed => {
                        self.remove_favorite(id);
                    }
                }
                self.set_sync_state(SyncState::Synced);
            }
            Err(error) => {
                tracing::warn!(%error, product_id = %id, "Remote toggle failed, applying local fallback");
                self.apply_local_toggle(was_favorite, id, target.into_product());
                self.set_sync_state(SyncState::Diverged);
            }
        }
    }

    fn apply_local_toggle(&self, was_favorite: bool, id: ProductId, product: Option<Product>) {
        if was_favorite {
            self.remove_favorite(id);
        } else if let Some(product) = product {
            self.add_favorite(&product);
        }
    }

    /// Replace the local collection with the remote list.
    ///
    /// Re-entrancy guarded: a call issued while another is in flight is
    /// dropped, not queued. Failures are logged and swallowed (the cache
    /// keeps serving).
    #[instrument(skip(self))]
    pub async fn load_from_api(&self) {
        if self.inner.loading.swap(true, Ordering::SeqCst) {
            tracing::debug!("Favorites load already in flight, dropping call");
            return;
        }

        match self.inner.api.favorites().await {
            Ok(products) => self.sync(products),
            Err(error) => {
                tracing::error!(%error, "Favorites load failed");
            }
        }

        self.inner.loading.store(false, Ordering::SeqCst);
    }

    /// Unconditionally replace the collection with an authoritative list
    /// and persist it.
    pub fn sync(&self, products: Vec<Product>) {
        *self.write_items() = products;
        self.persist();
        self.set_sync_state(SyncState::Synced);
    }

    /// Empty the collection and persist the empty list.
    pub fn clear_favorites(&self) {
        self.write_items().clear();
        self.persist();
    }

    /// Snapshot of the current collection.
    #[must_use]
    pub fn items(&self) -> Vec<Product> {
        self.read_items().clone()
    }

    /// Number of favorited products.
    #[must_use]
    pub fn count(&self) -> usize {
        self.read_items().len()
    }

    /// Whether anything is favorited.
    #[must_use]
    pub fn has_favorites(&self) -> bool {
        !self.read_items().is_empty()
    }

    /// Whether a remote load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// Whether the local copy is known to match the remote list.
    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        *self
            .inner
            .sync_state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize the full collection to the durable cache. Storage errors
    /// are logged, not surfaced: the cache is advisory.
    fn persist(&self) {
        let serialized = {
            let items = self.read_items();
            serde_json::to_string(&*items)
        };
        match serialized {
            Ok(raw) => {
                if let Err(error) = self.inner.store.set(FAVORITES_KEY, &raw) {
                    tracing::warn!(%error, "Failed to persist favorites cache");
                }
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to serialize favorites cache");
            }
        }
    }

    fn set_sync_state(&self, state: SyncState) {
        *self
            .inner
            .sync_state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn read_items(&self) -> std::sync::RwLockReadGuard<'_, Vec<Product>> {
        self.inner
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_items(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Product>> {
        self.inner
            .items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
