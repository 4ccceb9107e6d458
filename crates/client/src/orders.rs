//! Order history and checkout.

use std::sync::Arc;

use sprout_core::OrderId;
use tracing::instrument;

use crate::api::ApiClient;
use crate::api::types::{Order, OrderInput};
use crate::error::Result;

/// Client for the current user's orders. Uncached: order state changes
/// server-side as fulfillment progresses.
#[derive(Clone)]
pub struct OrdersClient {
    inner: Arc<ApiClient>,
}

impl OrdersClient {
    /// Create a new orders client.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(api),
        }
    }

    /// List the current user's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn orders(&self) -> Result<Vec<Order>> {
        self.inner.orders().await
    }

    /// Fetch a single order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the request fails.
    pub async fn order(&self, order_id: OrderId) -> Result<Order> {
        self.inner.order(order_id).await
    }

    /// Create an order from the given lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the order payload is rejected.
    #[instrument(skip(self, input), fields(lines = input.items.len()))]
    pub async fn create_order(&self, input: &OrderInput) -> Result<Order> {
        self.inner.create_order(input).await
    }
}
