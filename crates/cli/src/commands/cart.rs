//! Cart commands.

use sprout_client::Storefront;
use sprout_core::{CartItemId, ProductStockId};

/// Print the cart's lines and totals.
pub fn show(shop: &Storefront) {
    let items = shop.cart().items();
    if items.is_empty() {
        println!("Cart is empty");
        return;
    }

    for item in &items {
        let size = item.product_stock.size.as_deref().unwrap_or("-");
        let title = item
            .product_stock
            .product
            .as_ref()
            .map_or("?", |product| product.title.as_str());
        println!(
            "line {}  {} (size {})  x{}  {}",
            item.id,
            title,
            size,
            item.quantity,
            item.line_total()
        );
    }
    println!(
        "{} items, total {}",
        shop.cart().total_items(),
        shop.cart().total_price()
    );
}

/// Add a product stock to the cart.
pub async fn add(
    shop: &Storefront,
    stock: i32,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    shop.cart()
        .add_item(ProductStockId::new(stock), quantity)
        .await?;
    println!("Added {quantity} x stock {stock}");
    show(shop);
    Ok(())
}

/// Set a line's quantity.
pub async fn update(shop: &Storefront, item: i32, quantity: u32) {
    shop.cart()
        .update_item(CartItemId::new(item), quantity)
        .await;
    show(shop);
}

/// Remove a line from the cart.
pub async fn remove(shop: &Storefront, item: i32) {
    shop.cart().remove_item(CartItemId::new(item)).await;
    show(shop);
}

/// Merge the anonymous cart into the authenticated one.
pub async fn merge(shop: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    shop.cart().merge().await?;
    println!("Carts merged");
    show(shop);
    Ok(())
}
