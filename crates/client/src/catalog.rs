//! Read-only catalog access with in-memory caching.
//!
//! Products and categories are cached via `moka` (5-minute TTL). Search
//! queries bypass the cache; mutable state (cart, favorites) is never
//! cached.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use crate::api::ApiClient;
use crate::api::types::{Category, Product, ProductQuery};
use crate::error::Result;

/// Cache TTL for catalog reads.
const CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Categories(Vec<Category>),
}

/// Client for product and category listings.
///
/// Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    api: ApiClient,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogInner { api, cache }),
        }
    }

    /// List products, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        self.listed_products(None, query).await
    }

    /// List products in the boys section.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn boys_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        self.listed_products(Some("boys"), query).await
    }

    /// List products in the girls section.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn girls_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        self.listed_products(Some("girls"), query).await
    }

    async fn listed_products(
        &self,
        section: Option<&str>,
        query: &ProductQuery,
    ) -> Result<Vec<Product>> {
        let cache_key = format!(
            "products:{}:{}:{}",
            section.unwrap_or(""),
            query.category.map(|c| c.to_string()).unwrap_or_default(),
            query.page.unwrap_or(1)
        );

        // Check cache (search queries are never cached)
        if query.search.is_none()
            && let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = match section {
            Some(section) => self.inner.api.section_products(section, query).await?,
            None => self.inner.api.products(query).await?,
        };

        if query.search.is_none() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    /// Free-text product search, uncached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn search(&self, term: &str) -> Result<Vec<Product>> {
        let query = ProductQuery {
            search: Some(term.to_string()),
            ..ProductQuery::default()
        };
        self.inner.api.products(&query).await
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product> {
        let cache_key = format!("product:{slug}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.inner.api.product_by_slug(slug).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List categories, optionally for a named section (`boys`, `girls`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn categories(&self, section: Option<&str>) -> Result<Vec<Category>> {
        let cache_key = format!("categories:{}", section.unwrap_or(""));

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = self.inner.api.categories(section).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
