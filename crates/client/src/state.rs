//! The top-level [`Storefront`] handle wiring every store together.
//!
//! Construction is explicit: one durable store, one token store, one API
//! client, and the state containers built on top of them, all sharing the
//! same instances. There are no process-wide singletons; two `Storefront`
//! values are fully independent.

use crate::api::ApiClient;
use crate::cart::CartSynchronizer;
use crate::catalog::CatalogClient;
use crate::config::ShopConfig;
use crate::error::Result;
use crate::favorites::FavoritesSynchronizer;
use crate::orders::OrdersClient;
use crate::session::{ProfileSession, TokenStore};
use crate::storage::LocalStore;

/// One fully wired storefront client.
///
/// Cheap to clone; clones share every underlying store.
#[derive(Clone)]
pub struct Storefront {
    session: ProfileSession,
    cart: CartSynchronizer,
    favorites: FavoritesSynchronizer,
    catalog: CatalogClient,
    orders: OrdersClient,
}

impl Storefront {
    /// Wire up a storefront against the given configuration.
    ///
    /// Restores any persisted session tokens and cached favorites from the
    /// configured storage file. No network calls are made here; call
    /// [`Self::initialize`] to hydrate remote state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ShopConfig) -> Result<Self> {
        let store = LocalStore::open(&config.storage_path);
        let tokens = TokenStore::new(store.clone());
        let api = ApiClient::new(config, tokens.clone())?;

        Ok(Self {
            session: ProfileSession::new(api.clone(), tokens.clone()),
            cart: CartSynchronizer::new(api.clone()),
            favorites: FavoritesSynchronizer::new(api.clone(), tokens, store),
            catalog: CatalogClient::new(api.clone()),
            orders: OrdersClient::new(api),
        })
    }

    /// Hydrate remote state after startup.
    ///
    /// Fetches the profile when a token survived a restart, then the
    /// favorites list (authenticated only) and the current cart. Every step
    /// is best-effort: failures are logged by the respective store and
    /// never abort startup.
    pub async fn initialize(&self) {
        self.session.initialize().await;
        if self.session.tokens().is_authenticated() {
            self.favorites.load_from_api().await;
        }
        self.cart.load().await;
    }

    /// Authentication and profile state.
    #[must_use]
    pub fn session(&self) -> &ProfileSession {
        &self.session
    }

    /// The shared cart mirror.
    #[must_use]
    pub fn cart(&self) -> &CartSynchronizer {
        &self.cart
    }

    /// The shared favorites collection.
    #[must_use]
    pub fn favorites(&self) -> &FavoritesSynchronizer {
        &self.favorites
    }

    /// Cached catalog reads.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Order history and checkout.
    #[must_use]
    pub fn orders(&self) -> &OrdersClient {
        &self.orders
    }
}
