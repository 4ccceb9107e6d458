//! Integration test harness for the Sprout storefront client.
//!
//! Spins up an in-process mock of the shop REST API on an ephemeral port
//! and wires a [`Storefront`] against it, backed by a throwaway storage
//! file. The mock keeps cart, favorites and orders in memory, counts
//! selected requests, and can be scripted to fail: every authenticated
//! endpoint can be forced to 401 and the favorites toggle can be forced
//! to 500.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sprout-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::expect_used)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use sprout_client::api::types::Credentials;
use sprout_client::{ShopConfig, Storefront};
use tempfile::TempDir;

/// Fixed account the mock accepts out of the box.
pub const USERNAME: &str = "alice";
/// Password for [`USERNAME`].
pub const PASSWORD: &str = "correct-horse";
/// Access token issued by `POST /token/`.
pub const ACCESS_TOKEN: &str = "mock-access";
/// Refresh token issued by `POST /token/`.
pub const REFRESH_TOKEN: &str = "mock-refresh";
/// Access token issued by `POST /token/refresh/`.
pub const REFRESHED_ACCESS_TOKEN: &str = "mock-access-refreshed";

/// Per-unit price of every mock product, in store currency.
const UNIT_PRICE: u32 = 10;

type AppState = Arc<ShopInner>;

#[derive(Debug, Clone)]
struct CartLine {
    id: i32,
    stock: i32,
    quantity: u32,
}

#[derive(Default)]
struct ShopInner {
    cart: Mutex<Vec<CartLine>>,
    next_line_id: AtomicUsize,
    favorites: Mutex<Vec<i32>>,
    registered: Mutex<Vec<(String, String)>>,
    orders: Mutex<Vec<Value>>,
    // Scripted failures
    reject_all: AtomicBool,
    fail_toggle: AtomicBool,
    favorites_delay_ms: AtomicU64,
    // Request counters
    favorites_fetches: AtomicUsize,
    products_fetches: AtomicUsize,
    cart_item_deletes: AtomicUsize,
    toggle_calls: AtomicUsize,
}

/// In-process mock of the shop REST API.
pub struct MockShop {
    addr: SocketAddr,
    inner: AppState,
}

impl MockShop {
    /// Bind the mock on an ephemeral localhost port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let inner = Arc::new(ShopInner::default());
        let app = router(Arc::clone(&inner));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("mock listener address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock shop");
        });

        Self { addr, inner }
    }

    /// Base URL the client should be pointed at.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Force every authenticated endpoint to respond 401.
    pub fn reject_authenticated(&self, on: bool) {
        self.inner.reject_all.store(on, Ordering::SeqCst);
    }

    /// Force `POST /favorites/toggle/` to respond 500.
    pub fn fail_toggles(&self, on: bool) {
        self.inner.fail_toggle.store(on, Ordering::SeqCst);
    }

    /// Delay `GET /favorites/` responses, to widen concurrency windows.
    pub fn delay_favorites(&self, delay: Duration) {
        self.inner
            .favorites_delay_ms
            .store(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), Ordering::SeqCst);
    }

    /// Mark a product as favorited server-side.
    ///
    /// # Panics
    ///
    /// Panics if the favorites lock is poisoned.
    pub fn seed_favorite(&self, product_id: i32) {
        lock(&self.inner.favorites).push(product_id);
    }

    /// Server-side favorites snapshot.
    #[must_use]
    pub fn favorite_ids(&self) -> Vec<i32> {
        lock(&self.inner.favorites).clone()
    }

    /// Server-side cart snapshot as `(stock, quantity)` pairs.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<(i32, u32)> {
        lock(&self.inner.cart)
            .iter()
            .map(|line| (line.stock, line.quantity))
            .collect()
    }

    /// Number of `GET /favorites/` requests served.
    #[must_use]
    pub fn favorites_fetches(&self) -> usize {
        self.inner.favorites_fetches.load(Ordering::SeqCst)
    }

    /// Number of `GET /products/` requests served.
    #[must_use]
    pub fn products_fetches(&self) -> usize {
        self.inner.products_fetches.load(Ordering::SeqCst)
    }

    /// Number of `DELETE /cart-items/{id}/` requests served.
    #[must_use]
    pub fn cart_item_deletes(&self) -> usize {
        self.inner.cart_item_deletes.load(Ordering::SeqCst)
    }

    /// Number of `POST /favorites/toggle/` requests served.
    #[must_use]
    pub fn toggle_calls(&self) -> usize {
        self.inner.toggle_calls.load(Ordering::SeqCst)
    }
}

/// A mock shop plus a client wired against it with throwaway storage.
pub struct TestContext {
    pub server: MockShop,
    pub shop: Storefront,
    pub storage_path: PathBuf,
    _dir: TempDir,
}

impl TestContext {
    /// Start a mock shop and build an anonymous client against it.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be constructed.
    pub async fn new() -> Self {
        let server = MockShop::start().await;
        let dir = TempDir::new().expect("create storage dir");
        let storage_path = dir.path().join("state.json");
        let config =
            ShopConfig::new(&server.base_url(), &storage_path).expect("build client config");
        let shop = Storefront::new(&config).expect("build storefront client");

        Self {
            server,
            shop,
            storage_path,
            _dir: dir,
        }
    }

    /// Start a mock shop and log the fixed test account in.
    ///
    /// # Panics
    ///
    /// Panics if login fails.
    pub async fn logged_in() -> Self {
        let ctx = Self::new().await;
        ctx.shop
            .session()
            .login(&Credentials {
                username: USERNAME.to_owned(),
                password: PASSWORD.to_owned(),
            })
            .await
            .expect("login against mock shop");
        ctx
    }

    /// Read one key back from the durable storage file.
    ///
    /// # Panics
    ///
    /// Panics if the file exists but does not hold a JSON string map.
    #[must_use]
    pub fn stored_value(&self, key: &str) -> Option<String> {
        let raw = std::fs::read_to_string(&self.storage_path).ok()?;
        let entries: std::collections::HashMap<String, String> =
            serde_json::from_str(&raw).expect("storage file holds a string map");
        entries.get(key).cloned()
    }
}

/// JSON record for a mock product.
#[must_use]
pub fn product_json(id: i32) -> Value {
    json!({
        "id": id,
        "title": format!("Product {id}"),
        "slug": format!("product-{id}"),
        "article": format!("SP-{id:04}"),
        "price": format!("{UNIT_PRICE}.00"),
        "composition": "cotton 100%",
        "category": {"id": 1, "name": "T-shirts", "slug": "t-shirts"},
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Router and handlers
// ─────────────────────────────────────────────────────────────────────────────

fn router(state: AppState) -> Router {
    Router::new()
        .route("/token/", post(login))
        .route("/token/refresh/", post(refresh))
        .route("/auth/users/", post(register))
        .route("/profiles/me/", get(profile))
        .route("/profiles/update_me/", put(update_profile))
        .route("/favorites/", get(favorites))
        .route("/favorites/toggle/", post(toggle_favorite))
        .route("/carts/current/", get(current_cart))
        .route("/carts/merge/", post(merge_cart))
        .route("/cart-items/", post(add_cart_item))
        .route(
            "/cart-items/{id}/",
            put(update_cart_item).delete(delete_cart_item),
        )
        .route("/products/", get(products))
        .route("/products/boys/", get(section_products))
        .route("/products/girls/", get(section_products))
        .route("/products/{slug}/", get(product_by_slug))
        .route("/categories/", get(categories))
        .route("/categories/{section}/", get(categories))
        .route("/orders/", get(list_orders).post(create_order))
        .route("/orders/{id}/", get(get_order))
        .with_state(state)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn authorized(state: &ShopInner, headers: &HeaderMap) -> bool {
    if state.reject_all.load(Ordering::SeqCst) {
        return false;
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value == format!("Bearer {ACCESS_TOKEN}")
                || value == format!("Bearer {REFRESHED_ACCESS_TOKEN}")
        })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Authentication credentials were not provided."})),
    )
        .into_response()
}

fn cart_line_json(line: &CartLine) -> Value {
    let total = UNIT_PRICE * line.quantity;
    json!({
        "id": line.id,
        "product_stock": {
            "id": line.stock,
            "size": "104",
            "product": product_json(line.stock),
        },
        "quantity": line.quantity,
        "product_info": {
            "unit_price": format!("{UNIT_PRICE}.00"),
            "total_price": format!("{total}.00"),
        },
    })
}

async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let known = (username == USERNAME && password == PASSWORD)
        || lock(&state.registered)
            .iter()
            .any(|(u, p)| u == username && p == password);

    if known {
        Json(json!({"access": ACCESS_TOKEN, "refresh": REFRESH_TOKEN})).into_response()
    } else {
        unauthorized()
    }
}

async fn refresh(Json(body): Json<Value>) -> Response {
    if body["refresh"].as_str() == Some(REFRESH_TOKEN) {
        Json(json!({"access": REFRESHED_ACCESS_TOKEN})).into_response()
    } else {
        unauthorized()
    }
}

async fn register(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_owned();
    let password = body["password"].as_str().unwrap_or_default().to_owned();
    let email = body["email"].as_str().unwrap_or_default().to_owned();

    lock(&state.registered).push((username.clone(), password));
    (
        StatusCode::CREATED,
        Json(json!({"id": 2, "username": username, "email": email})),
    )
        .into_response()
}

async fn profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 1,
        "username": USERNAME,
        "email": "alice@example.com",
        "first_name": "Alice",
        "profile": {"phone_number": "+10000000000", "address": "1 Main St"},
    }))
    .into_response()
}

async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    // Echo back only the whitelisted fields that were sent, the way a
    // partial-update endpoint would.
    let mut response = json!({"id": 1, "username": USERNAME});
    for field in ["first_name", "last_name"] {
        if let Some(value) = body.get(field) {
            response[field] = value.clone();
        }
    }
    let mut details = serde_json::Map::new();
    for field in ["phone_number", "address"] {
        if let Some(value) = body.get(field) {
            details.insert(field.to_owned(), value.clone());
        }
    }
    if !details.is_empty() {
        response["profile"] = Value::Object(details);
    }
    Json(response).into_response()
}

async fn favorites(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.favorites_fetches.fetch_add(1, Ordering::SeqCst);

    let delay = state.favorites_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if !authorized(&state, &headers) {
        return unauthorized();
    }

    // Join-record shape, as served by the backend
    let entries: Vec<Value> = lock(&state.favorites)
        .iter()
        .map(|id| json!({"product": product_json(*id)}))
        .collect();
    Json(Value::Array(entries)).into_response()
}

async fn toggle_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.toggle_calls.fetch_add(1, Ordering::SeqCst);

    if state.fail_toggle.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "toggle unavailable"})),
        )
            .into_response();
    }
    if !authorized(&state, &headers) {
        return unauthorized();
    }

    #[allow(clippy::cast_possible_truncation)]
    let product_id = body["product_id"].as_i64().unwrap_or_default() as i32;

    let mut favorites = lock(&state.favorites);
    if let Some(pos) = favorites.iter().position(|id| *id == product_id) {
        favorites.remove(pos);
        Json(json!({"status": "removed"})).into_response()
    } else {
        favorites.push(product_id);
        Json(json!({"status": "added"})).into_response()
    }
}

async fn current_cart(State(state): State<AppState>) -> Response {
    let items: Vec<Value> = lock(&state.cart).iter().map(cart_line_json).collect();
    Json(json!({"items": items})).into_response()
}

async fn merge_cart() -> StatusCode {
    StatusCode::OK
}

async fn add_cart_item(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    #[allow(clippy::cast_possible_truncation)]
    let stock = body["product_stock"].as_i64().unwrap_or_default() as i32;
    #[allow(clippy::cast_possible_truncation)]
    let quantity = body["quantity"].as_u64().unwrap_or(1) as u32;

    let mut cart = lock(&state.cart);
    let line = if let Some(line) = cart.iter_mut().find(|line| line.stock == stock) {
        line.quantity += quantity;
        line.clone()
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let id = state.next_line_id.fetch_add(1, Ordering::SeqCst) as i32 + 1;
        let line = CartLine {
            id,
            stock,
            quantity,
        };
        cart.push(line.clone());
        line
    };
    (StatusCode::CREATED, Json(cart_line_json(&line))).into_response()
}

async fn update_cart_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Response {
    #[allow(clippy::cast_possible_truncation)]
    let quantity = body["quantity"].as_u64().unwrap_or_default() as u32;

    let mut cart = lock(&state.cart);
    match cart.iter_mut().find(|line| line.id == id) {
        Some(line) => {
            line.quantity = quantity;
            Json(cart_line_json(line)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_cart_item(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    state.cart_item_deletes.fetch_add(1, Ordering::SeqCst);

    let mut cart = lock(&state.cart);
    let before = cart.len();
    cart.retain(|line| line.id != id);
    if cart.len() == before {
        StatusCode::NOT_FOUND.into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn products(
    State(state): State<AppState>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Response {
    state.products_fetches.fetch_add(1, Ordering::SeqCst);

    let all: Vec<Value> = (1..=3).map(product_json).collect();
    let filtered: Vec<Value> = match params.get("search") {
        Some(term) => all
            .into_iter()
            .filter(|p| {
                p["title"]
                    .as_str()
                    .is_some_and(|title| title.contains(term.as_str()))
            })
            .collect(),
        None => all,
    };
    // Paginated shape
    Json(json!({"count": filtered.len(), "results": filtered})).into_response()
}

async fn section_products(State(state): State<AppState>) -> Response {
    state.products_fetches.fetch_add(1, Ordering::SeqCst);
    // Bare-array shape
    Json(Value::Array((4..=5).map(product_json).collect())).into_response()
}

async fn product_by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    state.products_fetches.fetch_add(1, Ordering::SeqCst);

    let found = (1..=5).find(|id| format!("product-{id}") == slug);
    match found {
        Some(id) => Json(product_json(id)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Not found."})),
        )
            .into_response(),
    }
}

async fn categories() -> Response {
    Json(json!([
        {"id": 1, "name": "T-shirts", "slug": "t-shirts"},
        {"id": 2, "name": "Overalls", "slug": "overalls"},
    ]))
    .into_response()
}

async fn list_orders(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(Value::Array(lock(&state.orders).clone())).into_response()
}

async fn get_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let orders = lock(&state.orders);
    match orders.iter().find(|order| order["id"].as_i64() == Some(id)) {
        Some(order) => Json(order.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }

    let items: Vec<Value> = body["items"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|item| {
            let quantity = item["quantity"].as_u64().unwrap_or(1);
            let total = u64::from(UNIT_PRICE) * quantity;
            json!({
                "product_stock": {"id": item["product_stock"], "size": "104"},
                "quantity": quantity,
                "product_info": {
                    "unit_price": format!("{UNIT_PRICE}.00"),
                    "total_price": format!("{total}.00"),
                },
            })
        })
        .collect();

    let total: u64 = items
        .iter()
        .map(|item| item["quantity"].as_u64().unwrap_or(0) * u64::from(UNIT_PRICE))
        .sum();

    let mut orders = lock(&state.orders);
    let id = i64::try_from(orders.len()).unwrap_or_default() + 1;
    let order = json!({
        "id": id,
        "status": "pending",
        "total_price": format!("{total}.00"),
        "created_at": "2026-01-15T10:30:00Z",
        "items": items,
    });
    orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}
