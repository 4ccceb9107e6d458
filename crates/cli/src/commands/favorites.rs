//! Favorites commands.

use sprout_client::Storefront;
use sprout_core::ProductId;

/// Print the favorites collection.
pub fn list(shop: &Storefront) {
    let items = shop.favorites().items();
    if items.is_empty() {
        println!("No favorites");
        return;
    }

    for product in &items {
        let price = product
            .price
            .map_or_else(|| "-".to_owned(), |price| price.to_string());
        println!("#{}  {}  {}", product.id, product.title, price);
    }
    println!("{} favorites", shop.favorites().count());
}

/// Flip a product's favorite state.
pub async fn toggle(shop: &Storefront, product: i32) {
    let id = ProductId::new(product);
    shop.favorites().toggle_favorite(id).await;

    if shop.favorites().is_favorite(id) {
        println!("Product {product} is now a favorite");
    } else {
        println!("Product {product} is no longer a favorite");
    }
}

/// Replace the local collection with the remote list.
pub async fn sync(shop: &Storefront) {
    shop.favorites().load_from_api().await;
    list(shop);
}
