//! Catalog commands.

use sprout_client::Storefront;
use sprout_client::api::types::{Product, ProductQuery};
use sprout_core::CategoryId;

/// List products, optionally filtered by section, category, page or search.
pub async fn products(
    shop: &Storefront,
    section: Option<&str>,
    category: Option<i32>,
    page: Option<u32>,
    search: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = ProductQuery {
        search,
        category: category.map(CategoryId::new),
        page,
    };

    let products = match section {
        Some("boys") => shop.catalog().boys_products(&query).await?,
        Some("girls") => shop.catalog().girls_products(&query).await?,
        Some(other) => return Err(format!("Unknown section: {other}").into()),
        None => shop.catalog().products(&query).await?,
    };

    if products.is_empty() {
        println!("No products");
        return Ok(());
    }
    for product in &products {
        print_product_line(product);
    }
    println!("{} products", products.len());
    Ok(())
}

/// Show a single product by slug.
pub async fn product(shop: &Storefront, slug: &str) -> Result<(), Box<dyn std::error::Error>> {
    let product = shop.catalog().product_by_slug(slug).await?;

    println!("#{}  {}", product.id, product.title);
    if let Some(article) = &product.article {
        println!("  article: {article}");
    }
    if let Some(price) = product.price {
        match product.old_price {
            Some(old_price) => println!("  price: {price} (was {old_price})"),
            None => println!("  price: {price}"),
        }
    }
    if let Some(composition) = &product.composition {
        println!("  composition: {composition}");
    }
    if let Some(category) = &product.category {
        println!("  category: {}", category.name);
    }
    Ok(())
}

/// List categories.
pub async fn categories(
    shop: &Storefront,
    section: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let categories = shop.catalog().categories(section).await?;

    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }
    for category in &categories {
        println!("#{}  {}", category.id, category.name);
    }
    Ok(())
}

fn print_product_line(product: &Product) {
    let price = product
        .price
        .map_or_else(|| "-".to_owned(), |price| price.to_string());
    let slug = product.slug.as_deref().unwrap_or("-");
    println!("#{}  {}  {}  [{}]", product.id, product.title, price, slug);
}
