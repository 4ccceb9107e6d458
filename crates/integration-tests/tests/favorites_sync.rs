//! Favorites synchronization: dual-mode toggling, the durable cache, and
//! the single-flight remote load.

use std::time::Duration;

use sprout_client::api::types::Product;
use sprout_client::{ShopConfig, Storefront, SyncState};
use sprout_core::ProductId;
use sprout_integration_tests::{MockShop, TestContext, product_json};

fn product(id: i32) -> Product {
    serde_json::from_value(product_json(id)).expect("mock product record parses")
}

#[tokio::test]
async fn double_toggle_restores_membership() {
    let ctx = TestContext::logged_in().await;
    let favorites = ctx.shop.favorites();
    let target = product(7);

    favorites.toggle_favorite(target.clone()).await;
    assert!(favorites.is_favorite(ProductId::new(7)));
    assert_eq!(ctx.server.favorite_ids(), vec![7]);

    favorites.toggle_favorite(target).await;
    assert!(!favorites.is_favorite(ProductId::new(7)));
    assert!(ctx.server.favorite_ids().is_empty());
    assert!(favorites.sync_state().is_synced());
}

#[tokio::test]
async fn anonymous_toggle_stays_local() {
    let ctx = TestContext::new().await;
    let favorites = ctx.shop.favorites();

    favorites.toggle_favorite(product(3)).await;

    assert!(favorites.is_favorite(ProductId::new(3)));
    // No remote call was made
    assert_eq!(ctx.server.toggle_calls(), 0);
    // But the collection was persisted
    let cached = ctx.stored_value("favorites").expect("favorites persisted");
    assert!(cached.contains("Product 3"));
}

#[tokio::test]
async fn local_add_and_remove_are_immediate_and_idempotent() {
    let ctx = TestContext::new().await;
    let favorites = ctx.shop.favorites();

    assert!(favorites.add_favorite(&product(1)));
    assert!(!favorites.add_favorite(&product(1)));
    assert_eq!(favorites.count(), 1);
    assert!(favorites.has_favorites());

    assert!(favorites.remove_favorite(ProductId::new(1)));
    assert!(!favorites.remove_favorite(ProductId::new(1)));
    assert_eq!(favorites.count(), 0);
}

#[tokio::test]
async fn malformed_cache_resets_to_empty() {
    let server = MockShop::start().await;
    let dir = tempfile::tempdir().expect("create storage dir");
    let path = dir.path().join("state.json");

    // A storage file whose favorites entry is not a product list
    std::fs::write(
        &path,
        serde_json::to_string(&serde_json::json!({"favorites": "definitely-not-a-list"}))
            .expect("serialize seed"),
    )
    .expect("write seed file");

    let config = ShopConfig::new(&server.base_url(), &path).expect("build client config");
    let shop = Storefront::new(&config).expect("build storefront client");

    assert_eq!(shop.favorites().count(), 0);
    assert!(!shop.favorites().has_favorites());
}

#[tokio::test]
async fn failed_remote_toggle_falls_back_locally_and_diverges() {
    let ctx = TestContext::logged_in().await;
    let favorites = ctx.shop.favorites();

    ctx.server.fail_toggles(true);
    favorites.toggle_favorite(product(9)).await;

    // Local flip applied anyway, remote untouched
    assert!(favorites.is_favorite(ProductId::new(9)));
    assert!(ctx.server.favorite_ids().is_empty());
    assert_eq!(favorites.sync_state(), SyncState::Diverged);

    // And the reverse direction: locally favorite, remote failing
    favorites.toggle_favorite(product(9)).await;
    assert!(!favorites.is_favorite(ProductId::new(9)));
}

#[tokio::test]
async fn concurrent_loads_collapse_to_one_request() {
    let ctx = TestContext::logged_in().await;
    let favorites = ctx.shop.favorites();

    ctx.server.seed_favorite(3);
    ctx.server.delay_favorites(Duration::from_millis(100));

    tokio::join!(favorites.load_from_api(), favorites.load_from_api());

    assert_eq!(ctx.server.favorites_fetches(), 1);
    assert_eq!(favorites.count(), 1);
    assert!(favorites.is_favorite(ProductId::new(3)));
}

#[tokio::test]
async fn remote_load_replaces_and_persists_the_collection() {
    let ctx = TestContext::logged_in().await;
    let favorites = ctx.shop.favorites();

    // Stale local entry that the server does not know about
    favorites.add_favorite(&product(99));

    ctx.server.seed_favorite(3);
    ctx.server.seed_favorite(4);
    favorites.load_from_api().await;

    assert_eq!(favorites.count(), 2);
    assert!(!favorites.is_favorite(ProductId::new(99)));

    let cached = ctx.stored_value("favorites").expect("favorites persisted");
    let parsed: Vec<Product> = serde_json::from_str(&cached).expect("cache holds product list");
    assert_eq!(parsed.len(), 2);
}

#[tokio::test]
async fn cache_survives_a_restart() {
    let ctx = TestContext::new().await;
    ctx.shop.favorites().add_favorite(&product(5));

    let config = ShopConfig::new(&ctx.server.base_url(), &ctx.storage_path)
        .expect("build client config");
    let restarted = Storefront::new(&config).expect("build storefront client");

    assert!(restarted.favorites().is_favorite(ProductId::new(5)));
}

#[tokio::test]
async fn clear_favorites_persists_the_empty_list() {
    let ctx = TestContext::new().await;
    let favorites = ctx.shop.favorites();

    favorites.add_favorite(&product(1));
    favorites.clear_favorites();

    assert_eq!(favorites.count(), 0);
    let cached = ctx.stored_value("favorites").expect("favorites persisted");
    assert_eq!(cached, "[]");
}
