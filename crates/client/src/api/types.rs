//! Wire types for the shop REST API.
//!
//! Response shapes are tolerant by design: unknown fields are ignored and
//! optional fields default, so backend serializer changes do not break the
//! client. List endpoints may return either a results-wrapped page or a
//! bare list; [`ListResponse`] normalizes both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sprout_core::{
    CartItemId, CategoryId, Email, OrderId, OrderStatus, Price, ProductId, ProductStockId, UserId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Login credentials for `POST /token/`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Token pair returned by `POST /token/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Fresh access token returned by `POST /token/refresh/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access: String,
}

/// Registration payload for `POST /auth/users/`.
///
/// `phone_number` and `address` are forwarded to the customer profile the
/// backend creates alongside the account.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationInput {
    pub username: String,
    pub email: Email,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

/// Customer profile sub-record nested in the user payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileDetails {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// User profile record from `GET /profiles/me/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile: Option<ProfileDetails>,
}

impl UserProfile {
    /// Shallow-merge an update response into an existing profile.
    ///
    /// Fields present in `update` overwrite; fields the response omits are
    /// retained from `self` (identity fields in particular).
    #[must_use]
    pub fn merged_with(self, update: Self) -> Self {
        Self {
            id: update.id,
            username: update.username,
            email: update.email.or(self.email),
            first_name: update.first_name.or(self.first_name),
            last_name: update.last_name.or(self.last_name),
            profile: update.profile.or(self.profile),
        }
    }
}

/// Whitelisted profile update payload for `PUT /profiles/update_me/`.
///
/// Only these four fields are ever sent; everything else on the profile is
/// server-owned.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ProfileUpdateInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub old_price: Option<Price>,
    #[serde(default)]
    pub composition: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Catalog list query parameters.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Free-text search term.
    pub search: Option<String>,
    /// Filter by category id.
    pub category: Option<CategoryId>,
    /// Page number for paginated listings.
    pub page: Option<u32>,
}

impl ProductQuery {
    /// Render as query-string pairs.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        params
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cart
// ─────────────────────────────────────────────────────────────────────────────

/// Reference to the product-stock row a cart line points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRef {
    pub id: ProductStockId,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub product: Option<Product>,
}

/// Server-computed pricing for a cart line.
///
/// `total_price` already includes any server-side pricing rules
/// (discounts, promotions); the client never recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    #[serde(default)]
    pub unit_price: Option<Price>,
    pub total_price: Price,
}

/// One line item in the cart. Identity is the server-assigned `id`;
/// addition dedups on `product_stock.id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_stock: StockRef,
    pub quantity: u32,
    #[serde(default)]
    pub product_info: Option<PriceInfo>,
}

impl CartItem {
    /// Server-computed line total, zero when the server sent no pricing.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product_info
            .as_ref()
            .map_or(Price::ZERO, |info| info.total_price)
    }
}

/// Response of `GET /carts/current/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CartPayload {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// Request body for `POST /cart-items/`.
#[derive(Debug, Clone, Serialize)]
pub struct AddCartItemRequest {
    pub product_stock: ProductStockId,
    pub quantity: u32,
}

/// Request body for `PUT /cart-items/{id}/`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Favorites
// ─────────────────────────────────────────────────────────────────────────────

/// One entry of the favorites list: either a join-record wrapping the
/// product one level down, or the product itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FavoriteEntry {
    Join { product: Product },
    Product(Product),
}

impl FavoriteEntry {
    /// Normalize to the product record.
    #[must_use]
    pub fn into_product(self) -> Product {
        match self {
            Self::Join { product } | Self::Product(product) => product,
        }
    }
}

/// Request body for `POST /favorites/toggle/`.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleRequest {
    pub product_id: ProductId,
}

/// Which state the server-side toggle resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleStatus {
    Added,
    Removed,
}

/// Response of `POST /favorites/toggle/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleOutcome {
    pub status: ToggleStatus,
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

/// One line of an order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub product_stock: StockRef,
    pub quantity: u32,
    #[serde(default)]
    pub product_info: Option<PriceInfo>,
}

/// Order record.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total_price: Option<Price>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// One line of an order creation request.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemInput {
    pub product_stock: ProductStockId,
    pub quantity: u32,
}

/// Request body for `POST /orders/`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderInput {
    pub items: Vec<OrderItemInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Pagination
// ─────────────────────────────────────────────────────────────────────────────

/// A list endpoint response: results-wrapped page or bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paged { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    /// Normalize to the contained list.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Paged { results } => results,
            Self::Bare(items) => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_json(id: i32) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": format!("Sun Hat {id}"),
            "slug": format!("sun-hat-{id}"),
            "price": "450.00"
        })
    }

    #[test]
    fn test_favorite_entry_join_record() {
        let raw = serde_json::json!({ "id": 99, "product": product_json(1) });
        let entry: FavoriteEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.into_product().id, ProductId::new(1));
    }

    #[test]
    fn test_favorite_entry_direct_product() {
        let entry: FavoriteEntry = serde_json::from_value(product_json(2)).unwrap();
        assert_eq!(entry.into_product().id, ProductId::new(2));
    }

    #[test]
    fn test_list_response_both_shapes() {
        let paged: ListResponse<Product> =
            serde_json::from_value(serde_json::json!({ "count": 1, "results": [product_json(1)] }))
                .unwrap();
        assert_eq!(paged.into_vec().len(), 1);

        let bare: ListResponse<Product> =
            serde_json::from_value(serde_json::json!([product_json(1), product_json(2)])).unwrap();
        assert_eq!(bare.into_vec().len(), 2);
    }

    #[test]
    fn test_toggle_status_wire_format() {
        let outcome: ToggleOutcome =
            serde_json::from_value(serde_json::json!({ "status": "added" })).unwrap();
        assert_eq!(outcome.status, ToggleStatus::Added);

        let outcome: ToggleOutcome =
            serde_json::from_value(serde_json::json!({ "status": "removed" })).unwrap();
        assert_eq!(outcome.status, ToggleStatus::Removed);
    }

    #[test]
    fn test_profile_merge_preserves_absent_fields() {
        let current = UserProfile {
            id: UserId::new(1),
            username: "u".to_string(),
            email: Some("u@example.com".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: None,
            profile: Some(ProfileDetails {
                phone_number: Some("111".to_string()),
                address: Some("Old st".to_string()),
            }),
        };
        let update = UserProfile {
            id: UserId::new(1),
            username: "u".to_string(),
            email: None,
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            profile: None,
        };

        let merged = current.merged_with(update);
        assert_eq!(merged.email.as_deref(), Some("u@example.com"));
        assert_eq!(merged.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(merged.profile.unwrap().phone_number.as_deref(), Some("111"));
    }

    #[test]
    fn test_product_parses_nested_category_record() {
        let raw = serde_json::json!({
            "id": 3,
            "title": "Sun Hat 3",
            "category": { "id": 1, "name": "Hats", "slug": "hats" }
        });
        let product: Product = serde_json::from_value(raw).unwrap();
        let category = product.category.unwrap();
        assert_eq!(category.id, CategoryId::new(1));
        assert_eq!(category.name, "Hats");
    }

    #[test]
    fn test_profile_details_tolerate_null_fields() {
        let raw = serde_json::json!({ "phone_number": null, "address": null });
        let details: ProfileDetails = serde_json::from_value(raw).unwrap();
        assert_eq!(details.phone_number, None);
        assert_eq!(details.address, None);
    }

    #[test]
    fn test_cart_item_tolerates_missing_pricing() {
        let raw = serde_json::json!({
            "id": 5,
            "product_stock": { "id": 7, "size": "92" },
            "quantity": 2
        });
        let item: CartItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.line_total(), Price::ZERO);
    }

    #[test]
    fn test_registration_input_skips_absent_optionals() {
        let input = RegistrationInput {
            username: "u".to_string(),
            email: Email::parse("u@example.com").unwrap(),
            password: "p".to_string(),
            first_name: None,
            phone_number: None,
            address: None,
        };
        let raw = serde_json::to_value(&input).unwrap();
        assert!(raw.get("phone_number").is_none());
        assert!(raw.get("address").is_none());
    }
}
