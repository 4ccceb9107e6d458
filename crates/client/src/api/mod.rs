//! Shop REST API client.
//!
//! One typed method per endpoint, all funneled through a single dispatch
//! path that injects the bearer token and applies the centralized 401
//! policy: any unauthorized response tears the session down (token clear)
//! before the error reaches the caller, regardless of which store issued
//! the call. The stores above never see a raw `reqwest` response.

pub mod types;

pub use types::*;

use std::sync::Arc;

use reqwest::{Method, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sprout_core::{CartItemId, OrderId, ProductId, ProductStockId};
use tracing::instrument;

use crate::config::ShopConfig;
use crate::error::{ApiError, Result};
use crate::session::TokenStore;

/// How much response body to keep in error values and logs.
const BODY_SNIPPET_LEN: usize = 500;

/// Client for the shop REST API.
///
/// Cheap to clone; clones share one connection pool and token store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ShopConfig, tokens: TokenStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.to_string(),
                tokens,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────────────

    /// Send a request with bearer injection and centralized status handling.
    async fn dispatch(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = match self.inner.tokens.bearer() {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("API returned 401, tearing down session");
            self.inner.tokens.clear();
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = snippet(&response.text().await.unwrap_or_default());
            tracing::error!(status = %status, body = %body, "API request failed");
            return Err(if status.is_client_error() {
                ApiError::Validation {
                    status: status.as_u16(),
                    body,
                }
            } else {
                ApiError::Unexpected {
                    status: status.as_u16(),
                    body,
                }
            });
        }

        Ok(response)
    }

    /// Read and parse a JSON response body, text-first for diagnostics.
    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|error| {
            tracing::error!(%error, body = %snippet(&text), "Failed to parse API response");
            ApiError::Parse(error)
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.dispatch(self.inner.http.get(self.endpoint(path))).await?;
        Self::parse(response).await
    }

    async fn get_json_with<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let request = self.inner.http.get(self.endpoint(path)).query(params);
        let response = self.dispatch(request).await?;
        Self::parse(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self
            .inner
            .http
            .request(method, self.endpoint(path))
            .json(body);
        let response = self.dispatch(request).await?;
        Self::parse(response).await
    }

    /// Send a request and discard any response body.
    async fn send_empty<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()> {
        let mut request = self.inner.http.request(method, self.endpoint(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.dispatch(request).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────

    /// Exchange credentials for a token pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        self.send_json(Method::POST, "token/", credentials).await
    }

    /// Mint a new access token from a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token is rejected or the request fails.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken> {
        self.send_json(
            Method::POST,
            "token/refresh/",
            &serde_json::json!({ "refresh": refresh_token }),
        )
        .await
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration payload is rejected.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: &RegistrationInput) -> Result<UserProfile> {
        self.send_json(Method::POST, "auth/users/", input).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the current user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is invalid.
    pub async fn profile(&self) -> Result<UserProfile> {
        self.get_json("profiles/me/").await
    }

    /// Update the whitelisted profile fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is rejected.
    pub async fn update_profile(&self, input: &ProfileUpdateInput) -> Result<UserProfile> {
        self.send_json(Method::PUT, "profiles/update_me/", input)
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Favorites
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the favorites list (page-wrapped or bare, entries possibly
    /// join-records) and normalize to product records.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn favorites(&self) -> Result<Vec<Product>> {
        let response: ListResponse<FavoriteEntry> = self.get_json("favorites/").await?;
        Ok(response
            .into_vec()
            .into_iter()
            .map(FavoriteEntry::into_product)
            .collect())
    }

    /// Flip a product's favorite state server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn toggle_favorite(&self, product_id: ProductId) -> Result<ToggleOutcome> {
        self.send_json(Method::POST, "favorites/toggle/", &ToggleRequest { product_id })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cart
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn current_cart(&self) -> Result<CartPayload> {
        self.get_json("carts/current/").await
    }

    /// Create a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(stock_id = %stock_id, quantity))]
    pub async fn add_cart_item(
        &self,
        stock_id: ProductStockId,
        quantity: u32,
    ) -> Result<CartItem> {
        self.send_json(
            Method::POST,
            "cart-items/",
            &AddCartItemRequest {
                product_stock: stock_id,
                quantity,
            },
        )
        .await
    }

    /// Update a cart line's quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn update_cart_item(&self, item_id: CartItemId, quantity: u32) -> Result<()> {
        self.send_empty(
            Method::PUT,
            &format!("cart-items/{item_id}/"),
            Some(&UpdateCartItemRequest { quantity }),
        )
        .await
    }

    /// Delete a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn remove_cart_item(&self, item_id: CartItemId) -> Result<()> {
        self.send_empty::<()>(Method::DELETE, &format!("cart-items/{item_id}/"), None)
            .await
    }

    /// Merge the anonymous cart into the authenticated one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn merge_cart(&self) -> Result<()> {
        self.send_empty::<()>(Method::POST, "carts/merge/", None).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────

    /// List products, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let response: ListResponse<Product> = self
            .get_json_with("products/", &query.to_params())
            .await?;
        Ok(response.into_vec())
    }

    /// List products in a named section (`boys`, `girls`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn section_products(
        &self,
        section: &str,
        query: &ProductQuery,
    ) -> Result<Vec<Product>> {
        let response: ListResponse<Product> = self
            .get_json_with(&format!("products/{section}/"), &query.to_params())
            .await?;
        Ok(response.into_vec())
    }

    /// Fetch a single product by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is missing or the request fails.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product> {
        self.get_json(&format!("products/{slug}/")).await
    }

    /// List categories, optionally within a named section.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn categories(&self, section: Option<&str>) -> Result<Vec<Category>> {
        let path = section.map_or_else(
            || "categories/".to_string(),
            |section| format!("categories/{section}/"),
        );
        let response: ListResponse<Category> = self.get_json(&path).await?;
        Ok(response.into_vec())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Orders
    // ─────────────────────────────────────────────────────────────────────

    /// List the current user's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn orders(&self) -> Result<Vec<Order>> {
        let response: ListResponse<Order> = self.get_json("orders/").await?;
        Ok(response.into_vec())
    }

    /// Fetch a single order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is missing or the request fails.
    pub async fn order(&self, order_id: OrderId) -> Result<Order> {
        self.get_json(&format!("orders/{order_id}/")).await
    }

    /// Create an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order payload is rejected.
    #[instrument(skip(self, input), fields(lines = input.items.len()))]
    pub async fn create_order(&self, input: &OrderInput) -> Result<Order> {
        self.send_json(Method::POST, "orders/", input).await
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(BODY_SNIPPET_LEN).collect()
}
