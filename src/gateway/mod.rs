//! Products/orders gateway client.
//!
//! The gateway is the single backend origin for both collections. Every
//! request carries the session's bearer token; the gateway is the sole
//! authority on validation, stock, and role enforcement, so this client
//! never pre-checks anything locally.
//!
//! # Endpoints
//!
//! | Method | Path          | Purpose                      |
//! |--------|---------------|------------------------------|
//! | GET    | /products     | list products                |
//! | GET    | /products/:id | fetch one product            |
//! | POST   | /products     | create product (admin)       |
//! | PUT    | /products/:id | update product (admin)       |
//! | DELETE | /products/:id | delete product (admin)       |
//! | GET    | /orders       | list the caller's orders     |
//! | GET    | /orders/all   | list all orders (admin)      |
//! | POST   | /orders       | place an order               |

pub mod types;

pub use types::{LOW_STOCK_THRESHOLD, Order, OrderInput, Product, ProductInput};

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::models::ProductId;

/// Errors that can occur when calling the gateway.
///
/// The 401/403 statuses get their own variants because the console reacts
/// to them differently: 401 ends the session, 403 only reports.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport failed before any status arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the bearer token (401).
    #[error("authentication expired")]
    Unauthorized,

    /// The gateway refused the operation for this role (403).
    #[error("authorization denied")]
    Forbidden,

    /// Any other failure status, with the server message when one parses.
    #[error("gateway request failed: {message}")]
    Failed {
        /// Response status code.
        status: reqwest::StatusCode,
        /// Server-supplied message, or `HTTP <status>` when absent.
        message: String,
    },
}

/// Spring-style error body; only the human message matters here.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Client for the products/orders gateway.
///
/// Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<GatewayClientInner>,
}

struct GatewayClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a new gateway client for the given base URL (no trailing slash).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: Arc::new(GatewayClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Products
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch the full product catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    #[instrument(skip(self, token))]
    pub async fn list_products(&self, token: &str) -> Result<Vec<Product>, GatewayError> {
        let response = self
            .inner
            .client
            .get(self.url("/products"))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Fetch a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn get_product(&self, token: &str, id: ProductId) -> Result<Product, GatewayError> {
        let response = self
            .inner
            .client
            .get(self.url(&format!("/products/{id}")))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        token: &str,
        input: &ProductInput,
    ) -> Result<Product, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url("/products"))
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &str,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, GatewayError> {
        let response = self
            .inner
            .client
            .put(self.url(&format!("/products/{id}")))
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Delete a product. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &str, id: ProductId) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .delete(self.url(&format!("/products/{id}")))
            .bearer_auth(token)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Orders
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch the caller's own orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    #[instrument(skip(self, token))]
    pub async fn list_own_orders(&self, token: &str) -> Result<Vec<Order>, GatewayError> {
        let response = self
            .inner
            .client
            .get(self.url("/orders"))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Fetch every order (admin view).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    #[instrument(skip(self, token))]
    pub async fn list_all_orders(&self, token: &str) -> Result<Vec<Order>, GatewayError> {
        let response = self
            .inner
            .client
            .get(self.url("/orders/all"))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    #[instrument(skip(self, token, input))]
    pub async fn place_order(
        &self,
        token: &str,
        input: &OrderInput,
    ) -> Result<Order, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url("/orders"))
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

/// Map a non-success status to its error variant, draining the body for
/// the server's message where one applies.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        reqwest::StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized),
        reqwest::StatusCode::FORBIDDEN => Err(GatewayError::Forbidden),
        _ => {
            let message = response
                .text()
                .await
                .ok()
                .as_deref()
                .and_then(parse_error_message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(GatewayError::Failed { status, message })
        }
    }
}

/// Pull the human message out of an error body, best effort.
fn parse_error_message(text: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(text)
        .ok()?
        .message
        .filter(|message| !message.is_empty())
}
