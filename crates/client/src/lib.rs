//! Sprout storefront client library.
//!
//! Typed REST client and client-side state containers for the Sprout
//! kids-clothing shop: authentication and profile ([`session`]), the cart
//! mirror ([`cart`]), the favorites collection ([`favorites`]), cached
//! catalog reads ([`catalog`]) and order history ([`orders`]), all wired
//! together by [`state::Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod favorites;
pub mod orders;
pub mod session;
pub mod state;
pub mod storage;
pub mod sync;

pub use cart::CartSynchronizer;
pub use catalog::CatalogClient;
pub use config::ShopConfig;
pub use error::{ApiError, Result};
pub use favorites::FavoritesSynchronizer;
pub use orders::OrdersClient;
pub use session::{ProfileSession, TokenStore};
pub use state::Storefront;
pub use storage::LocalStore;
pub use sync::SyncState;
