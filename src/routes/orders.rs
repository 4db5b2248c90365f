//! Order route handlers.
//!
//! Ordering is a two-step dialog: a quantity page for the chosen product,
//! then a POST carrying the quantity and the price at the time of ordering.
//! Orders are never edited or deleted here, and no stock check happens
//! client-side; the gateway is the sole authority on fulfillment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::gateway::{OrderInput, Product, types::ProductItem};
use crate::middleware::RequireUser;
use crate::models::{Feedback, ProductId, set_feedback};
use crate::routes::report_failure;
use crate::state::AppState;

/// Order form fields: quantity as entered, price as the dialog rendered it.
#[derive(Debug, Deserialize)]
pub struct OrderForm {
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub price: String,
}

/// Quantity dialog template.
#[derive(Template, WebTemplate)]
#[template(path = "order_quantity.html")]
pub struct OrderQuantityTemplate {
    pub product: Product,
}

/// Show the order quantity dialog for a product.
///
/// # Route
///
/// `GET /products/{id}/order`
#[instrument(skip(state, session, viewer), fields(product_id = %id))]
pub async fn quantity_dialog(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    RequireUser(viewer): RequireUser,
) -> Response {
    match state
        .gateway()
        .get_product(&viewer.access_token, ProductId::new(id))
        .await
    {
        Ok(product) => OrderQuantityTemplate { product }.into_response(),
        Err(err) => report_failure(&session, "load product", &err, "/")
            .await
            .into_response(),
    }
}

/// Place an order for a product.
///
/// Missing, non-numeric, or non-positive quantity aborts silently: no
/// gateway call, no state change, just the redirect back to the console.
/// Success redirects too, and that render refetches both orders and
/// products (stock may have changed server-side).
///
/// # Route
///
/// `POST /products/{id}/order`
#[instrument(skip(state, session, viewer, form), fields(product_id = %id))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    RequireUser(viewer): RequireUser,
    Form(form): Form<OrderForm>,
) -> Response {
    let quantity = match form.quantity.trim().parse::<u32>() {
        Ok(quantity) if quantity > 0 => quantity,
        _ => {
            tracing::debug!(quantity = %form.quantity, "Order aborted: invalid quantity");
            return Redirect::to("/").into_response();
        }
    };
    let Ok(price) = form.price.trim().parse::<Decimal>() else {
        tracing::debug!(price = %form.price, "Order aborted: invalid price");
        return Redirect::to("/").into_response();
    };

    let input = OrderInput {
        product_items: vec![ProductItem {
            product_id: ProductId::new(id),
            quantity,
            price,
        }],
    };

    match state.gateway().place_order(&viewer.access_token, &input).await {
        Ok(order) => {
            tracing::info!(order_id = %order.id, "Order placed");
            set_feedback(
                &session,
                Feedback::Notice("Order placed successfully!".to_string()),
            )
            .await;
            Redirect::to("/").into_response()
        }
        Err(err) => report_failure(&session, "place order", &err, "/")
            .await
            .into_response(),
    }
}
