//! Wire types for the products/orders gateway.
//!
//! Shapes are owned by the gateway: camelCase field names, money as JSON
//! numbers, dates as `YYYY-MM-DD`. Local copies are read-only snapshots
//! replaced wholesale on every fetch.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{OrderId, ProductId};

/// Stock level at or below which the catalog shows the low-stock warning.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Stock on hand.
    pub quantity: u32,
}

impl Product {
    /// Whether the stock level warrants the low-stock warning.
    #[must_use]
    pub const fn low_stock(&self) -> bool {
        self.quantity <= LOW_STOCK_THRESHOLD
    }

    /// Whether the product can currently be ordered.
    #[must_use]
    pub const fn orderable(&self) -> bool {
        self.quantity > 0
    }
}

/// Fields for creating or updating a product.
///
/// The ID never rides in the body; updates target it via the URL.
#[derive(Debug, Clone, Serialize)]
pub struct ProductInput {
    /// Product name (the gateway rejects blank names).
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Unit price (>= 0).
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Stock on hand (>= 0).
    pub quantity: u32,
}

/// An order as the gateway reports it.
///
/// Immutable from this client after creation; the status label and the
/// amount are computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Server-assigned ID.
    pub id: OrderId,
    /// Owning username; shown in the admin view.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Order date.
    pub date: NaiveDate,
    /// Opaque status label owned by the gateway (e.g. `PENDING`).
    pub status: String,
    /// Order total.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Line items.
    #[serde(default)]
    pub product_items: Vec<ProductItem>,
}

/// A line item inside an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    /// The ordered product.
    pub product_id: ProductId,
    /// Quantity ordered (at least 1).
    pub quantity: u32,
    /// Unit price at the time of ordering.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Body for placing an order.
///
/// A single-item list in this console; the shape supports multiple items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    /// Line items to order.
    pub product_items: Vec<ProductItem>,
}
