//! Console page route handler.
//!
//! The single page: fetches both collections from the gateway, derives the
//! view from the requester's role, and renders the product form when a
//! create/edit is in progress. Every mutation redirects back here, so each
//! render is a fresh read of the authoritative state (refetch-after-write).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::gateway::{GatewayError, Order, Product};
use crate::middleware::RequireUser;
use crate::models::{Feedback, ProductDraft, ProductId, take_feedback, take_redraft};
use crate::routes::{failure_message, report_failure};
use crate::state::AppState;

/// Query parameters selecting the product form state.
///
/// `edit` and `new` are mutually exclusive; `edit` wins. Both are free
/// text so a garbled query degrades to a plain render instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct ConsoleQuery {
    /// Product to copy into the draft and mark as the edit target.
    pub edit: Option<String>,
    /// Any value opens the empty create form.
    pub new: Option<String>,
}

/// Product form as the console renders it.
pub struct FormView {
    /// Edit target; `None` means the create form.
    pub edit_id: Option<ProductId>,
    /// Draft fields, free text until submission.
    pub draft: ProductDraft,
}

/// Console page template.
#[derive(Template, WebTemplate)]
#[template(path = "console.html")]
pub struct ConsoleTemplate {
    pub username: String,
    pub is_admin: bool,
    pub feedback: Option<Feedback>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub form: Option<FormView>,
}

/// Display the console page.
///
/// # Route
///
/// `GET /`
#[instrument(skip(state, session, viewer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ConsoleQuery>,
    RequireUser(viewer): RequireUser,
) -> Response {
    let token = &viewer.access_token;

    // One-shot view state is consumed up front; a fetch failure below
    // overwrites the banner (single slot, last outcome wins).
    let mut feedback = take_feedback(&session).await;
    let redraft = take_redraft(&session).await;

    let products = match state.gateway().list_products(token).await {
        Ok(products) => products,
        Err(GatewayError::Unauthorized) => {
            return report_failure(&session, "fetch products", &GatewayError::Unauthorized, "/")
                .await
                .into_response();
        }
        Err(err) => {
            tracing::warn!(error = %err, "Gateway operation failed");
            feedback = Some(Feedback::Error(failure_message("fetch products", &err)));
            Vec::new()
        }
    };

    // Same operation, endpoint selected by role.
    let orders_result = if viewer.role.is_admin() {
        state.gateway().list_all_orders(token).await
    } else {
        state.gateway().list_own_orders(token).await
    };
    let orders = match orders_result {
        Ok(orders) => orders,
        Err(GatewayError::Unauthorized) => {
            return report_failure(&session, "fetch orders", &GatewayError::Unauthorized, "/")
                .await
                .into_response();
        }
        Err(err) => {
            tracing::warn!(error = %err, "Gateway operation failed");
            feedback = Some(Feedback::Error(failure_message("fetch orders", &err)));
            Vec::new()
        }
    };

    let form = form_view(&query, redraft, &products, viewer.role.is_admin());

    ConsoleTemplate {
        username: viewer.username,
        is_admin: viewer.role.is_admin(),
        feedback,
        products,
        orders,
        form,
    }
    .into_response()
}

/// Resolve which product form (if any) the render shows.
///
/// Only administrators see the form at all. A stashed failed submission
/// takes priority; otherwise `?edit={id}` copies that product's current
/// fields into the draft, and `?new=...` opens the empty create form.
/// An unparseable `edit` value is treated as absent. Navigating here
/// without either discards any draft unconditionally (the redraft was
/// already consumed).
fn form_view(
    query: &ConsoleQuery,
    redraft: Option<crate::models::FormRedraft>,
    products: &[Product],
    is_admin: bool,
) -> Option<FormView> {
    if !is_admin {
        return None;
    }

    if let Some(redraft) = redraft {
        return Some(FormView {
            edit_id: redraft.edit_id,
            draft: redraft.draft,
        });
    }

    if let Some(edit_id) = parse_edit_id(query) {
        let edit_id = ProductId::new(edit_id);
        // An unknown id renders no form; the list is the authority.
        let product = products.iter().find(|p| p.id == edit_id)?;
        return Some(FormView {
            edit_id: Some(edit_id),
            draft: ProductDraft {
                name: product.name.clone(),
                description: product.description.clone().unwrap_or_default(),
                price: product.price.to_string(),
                quantity: product.quantity.to_string(),
            },
        });
    }

    if query.new.is_some() {
        return Some(FormView {
            edit_id: None,
            draft: ProductDraft::default(),
        });
    }

    None
}

fn parse_edit_id(query: &ConsoleQuery) -> Option<i64> {
    query.edit.as_deref()?.trim().parse().ok()
}
