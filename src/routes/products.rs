//! Product catalog route handlers.
//!
//! Create, update, and delete post to the gateway and redirect back to the
//! console, whose render is the refetch. A failed submit stashes the draft
//! so the form reopens populated; delete goes through an explicit
//! confirmation page first.

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
use crate::gateway::{Product, ProductInput};
use crate::middleware::RequireUser;
use crate::models::{
    Feedback, FormRedraft, ProductDraft, ProductId, set_feedback, stash_redraft,
};
use crate::routes::report_failure;
use crate::state::AppState;

/// Product form fields exactly as submitted.
///
/// Numeric fields arrive as free text; the input widgets constrain them
/// (`type=number`, `min`, `step`) and the handler parses them at the type
/// boundary. There is no further validation layer.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    pub quantity: String,
}

impl ProductForm {
    fn draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
            quantity: self.quantity.clone(),
        }
    }

    /// Parse the free-text draft into the gateway body.
    fn parse(&self) -> Result<ProductInput, String> {
        let price = self
            .price
            .trim()
            .parse::<Decimal>()
            .map_err(|_| "Enter a valid price.".to_string())?;
        let quantity = self
            .quantity
            .trim()
            .parse::<u32>()
            .map_err(|_| "Enter a valid quantity.".to_string())?;
        if price < Decimal::ZERO {
            return Err("Enter a valid price.".to_string());
        }

        Ok(ProductInput {
            name: self.name.trim().to_string(),
            description: match self.description.trim() {
                "" => None,
                text => Some(text.to_string()),
            },
            price,
            quantity,
        })
    }
}

/// Delete confirmation dialog template.
#[derive(Template, WebTemplate)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub product: Product,
}

/// Create a product.
///
/// # Route
///
/// `POST /products`
#[instrument(skip(state, session, viewer, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireUser(viewer): RequireUser,
    Form(form): Form<ProductForm>,
) -> Response {
    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            return reopen_form(&session, None, form.draft(), message).await;
        }
    };

    match state
        .gateway()
        .create_product(&viewer.access_token, &input)
        .await
    {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            set_feedback(&session, Feedback::Notice("Product created.".to_string())).await;
            Redirect::to("/").into_response()
        }
        Err(err) => {
            // Keep the form open with the submission intact.
            stash_redraft(
                &session,
                FormRedraft {
                    edit_id: None,
                    draft: form.draft(),
                },
            )
            .await;
            report_failure(&session, "create product", &err, "/")
                .await
                .into_response()
        }
    }
}

/// Update a product.
///
/// # Route
///
/// `POST /products/{id}`
#[instrument(skip(state, session, viewer, form), fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    RequireUser(viewer): RequireUser,
    Form(form): Form<ProductForm>,
) -> Response {
    let id = ProductId::new(id);

    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            return reopen_form(&session, Some(id), form.draft(), message).await;
        }
    };

    match state
        .gateway()
        .update_product(&viewer.access_token, id, &input)
        .await
    {
        Ok(_) => {
            tracing::info!(product_id = %id, "Product updated");
            set_feedback(&session, Feedback::Notice("Product updated.".to_string())).await;
            Redirect::to("/").into_response()
        }
        Err(err) => {
            stash_redraft(
                &session,
                FormRedraft {
                    edit_id: Some(id),
                    draft: form.draft(),
                },
            )
            .await;
            report_failure(&session, "update product", &err, "/")
                .await
                .into_response()
        }
    }
}

/// Show the delete confirmation dialog.
///
/// The irreversible request is only sent by the confirming POST.
///
/// # Route
///
/// `GET /products/{id}/delete`
#[instrument(skip(state, session, viewer), fields(product_id = %id))]
pub async fn confirm_delete(
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
        Ok(product) => ConfirmDeleteTemplate { product }.into_response(),
        Err(err) => report_failure(&session, "load product", &err, "/")
            .await
            .into_response(),
    }
}

/// Delete a product. Irreversible.
///
/// # Route
///
/// `POST /products/{id}/delete`
#[instrument(skip(state, session, viewer), fields(product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    RequireUser(viewer): RequireUser,
) -> Response {
    match state
        .gateway()
        .delete_product(&viewer.access_token, ProductId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(product_id = id, "Product deleted");
            set_feedback(&session, Feedback::Notice("Product deleted.".to_string())).await;
            Redirect::to("/").into_response()
        }
        Err(err) => report_failure(&session, "delete product", &err, "/")
            .await
            .into_response(),
    }
}

/// Stash the failed draft and surface the parse message.
async fn reopen_form(
    session: &Session,
    edit_id: Option<ProductId>,
    draft: ProductDraft,
    message: String,
) -> Response {
    stash_redraft(session, FormRedraft { edit_id, draft }).await;
    set_feedback(session, Feedback::Error(message)).await;
    Redirect::to("/").into_response()
}
