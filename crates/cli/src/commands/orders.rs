//! Order history commands.

use sprout_client::Storefront;
use sprout_core::OrderId;

/// List the current user's orders.
pub async fn list(shop: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    let orders = shop.orders().orders().await?;

    if orders.is_empty() {
        println!("No orders");
        return Ok(());
    }
    for order in &orders {
        let total = order
            .total_price
            .map_or_else(|| "-".to_owned(), |price| price.to_string());
        let created = order
            .created_at
            .map_or_else(|| "-".to_owned(), |ts| ts.to_rfc3339());
        println!("order {}  {}  {}  {}", order.id, order.status, total, created);
    }
    Ok(())
}

/// Show a single order with its lines.
pub async fn show(shop: &Storefront, order: i32) -> Result<(), Box<dyn std::error::Error>> {
    let order = shop.orders().order(OrderId::new(order)).await?;

    println!("order {}  status: {}", order.id, order.status);
    for item in &order.items {
        let title = item
            .product_stock
            .product
            .as_ref()
            .map_or("?", |product| product.title.as_str());
        println!("  {}  x{}", title, item.quantity);
    }
    if let Some(total) = order.total_price {
        println!("  total: {total}");
    }
    Ok(())
}
