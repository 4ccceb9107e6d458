//! Catalog caching behavior and the order flow against the mock shop.

use sprout_client::ApiError;
use sprout_client::api::types::{OrderInput, OrderItemInput, ProductQuery};
use sprout_core::{OrderStatus, ProductStockId};
use sprout_integration_tests::TestContext;

#[tokio::test]
async fn product_listings_are_cached() {
    let ctx = TestContext::new().await;
    let query = ProductQuery::default();

    let first = ctx.shop.catalog().products(&query).await.expect("list products");
    let second = ctx.shop.catalog().products(&query).await.expect("list products");

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    // Second listing was served from cache
    assert_eq!(ctx.server.products_fetches(), 1);
}

#[tokio::test]
async fn search_bypasses_the_cache() {
    let ctx = TestContext::new().await;

    let hits = ctx.shop.catalog().search("Product 2").await.expect("search");
    assert_eq!(hits.len(), 1);

    ctx.shop.catalog().search("Product 2").await.expect("search");
    assert_eq!(ctx.server.products_fetches(), 2);
}

#[tokio::test]
async fn product_by_slug_is_cached() {
    let ctx = TestContext::new().await;

    let product = ctx
        .shop
        .catalog()
        .product_by_slug("product-2")
        .await
        .expect("product found");
    assert_eq!(product.title, "Product 2");

    ctx.shop
        .catalog()
        .product_by_slug("product-2")
        .await
        .expect("product found");
    assert_eq!(ctx.server.products_fetches(), 1);
}

#[tokio::test]
async fn missing_product_is_a_validation_error() {
    let ctx = TestContext::new().await;

    let error = ctx
        .shop
        .catalog()
        .product_by_slug("no-such-product")
        .await
        .expect_err("404 surfaces");

    assert!(matches!(error, ApiError::Validation { status: 404, .. }));
}

#[tokio::test]
async fn section_listings_parse_the_bare_array_shape() {
    let ctx = TestContext::new().await;
    let query = ProductQuery::default();

    let boys = ctx
        .shop
        .catalog()
        .boys_products(&query)
        .await
        .expect("boys section");
    assert_eq!(boys.len(), 2);
}

#[tokio::test]
async fn categories_list_with_and_without_section() {
    let ctx = TestContext::new().await;

    let all = ctx.shop.catalog().categories(None).await.expect("categories");
    assert_eq!(all.len(), 2);

    let boys = ctx
        .shop
        .catalog()
        .categories(Some("boys"))
        .await
        .expect("section categories");
    assert_eq!(boys.len(), 2);
}

#[tokio::test]
async fn cache_invalidation_forces_a_refetch() {
    let ctx = TestContext::new().await;
    let query = ProductQuery::default();

    ctx.shop.catalog().products(&query).await.expect("list products");
    ctx.shop.catalog().invalidate_all().await;
    ctx.shop.catalog().products(&query).await.expect("list products");

    assert_eq!(ctx.server.products_fetches(), 2);
}

#[tokio::test]
async fn order_roundtrip() {
    let ctx = TestContext::logged_in().await;

    let order = ctx
        .shop
        .orders()
        .create_order(&OrderInput {
            items: vec![
                OrderItemInput {
                    product_stock: ProductStockId::new(1),
                    quantity: 2,
                },
                OrderItemInput {
                    product_stock: ProductStockId::new(2),
                    quantity: 1,
                },
            ],
            address: Some("1 Main St".to_owned()),
            phone_number: None,
        })
        .await
        .expect("order accepted");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);
    // Mock prices every unit at 10.00
    assert_eq!(
        order.total_price.expect("order total").to_string(),
        "30.00"
    );

    let listed = ctx.shop.orders().orders().await.expect("list orders");
    assert_eq!(listed.len(), 1);

    let fetched = ctx.shop.orders().order(order.id).await.expect("fetch order");
    assert_eq!(fetched.id, order.id);
}

#[tokio::test]
async fn orders_require_authentication() {
    let ctx = TestContext::new().await;

    let error = ctx.shop.orders().orders().await.expect_err("401 surfaces");
    assert!(error.is_unauthorized());
}
