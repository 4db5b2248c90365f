//! Session-related types.
//!
//! View state stored in the session: the one-shot feedback banner and a
//! failed product form kept for redraft. The identity provider token set
//! lives in `crate::idp` and is stored under [`keys::TOKEN_SET`].

use serde::{Deserialize, Serialize};

use crate::models::ids::ProductId;

/// One-shot banner shown on the next console render.
///
/// The console holds at most one message at a time; each operation outcome
/// overwrites the previous one, and rendering consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Feedback {
    /// A failed operation, rendered as an error banner.
    Error(String),
    /// A successful operation, rendered as a notice banner.
    Notice(String),
}

impl Feedback {
    /// The message text, regardless of severity.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Error(text) | Self::Notice(text) => text,
        }
    }

    /// Whether this is an error banner.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Product form fields exactly as the user submitted them.
///
/// Numeric fields stay free text until the submit handler parses them;
/// a failed submit stashes the whole draft so the form reopens populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Product name.
    pub name: String,
    /// Product description (may be empty).
    pub description: String,
    /// Price as entered.
    pub price: String,
    /// Stock quantity as entered.
    pub quantity: String,
}

/// A failed product submit stashed for the next render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormRedraft {
    /// Edit target; `None` means the create form.
    pub edit_id: Option<ProductId>,
    /// The submitted fields.
    pub draft: ProductDraft,
}

/// Set the one-shot feedback banner, replacing any previous message.
pub async fn set_feedback(session: &tower_sessions::Session, feedback: Feedback) {
    if let Err(err) = session.insert(keys::FEEDBACK, feedback).await {
        tracing::warn!(error = %err, "Failed to store feedback in session");
    }
}

/// Take the one-shot feedback banner, clearing it from the session.
pub async fn take_feedback(session: &tower_sessions::Session) -> Option<Feedback> {
    session.remove::<Feedback>(keys::FEEDBACK).await.ok().flatten()
}

/// Stash a failed product form so the next render re-opens it populated.
pub async fn stash_redraft(session: &tower_sessions::Session, redraft: FormRedraft) {
    if let Err(err) = session.insert(keys::FORM_REDRAFT, redraft).await {
        tracing::warn!(error = %err, "Failed to store form redraft in session");
    }
}

/// Take a stashed product form, clearing it from the session.
pub async fn take_redraft(session: &tower_sessions::Session) -> Option<FormRedraft> {
    session
        .remove::<FormRedraft>(keys::FORM_REDRAFT)
        .await
        .ok()
        .flatten()
}

/// Session keys for authentication and view state.
pub mod keys {
    /// Key for the identity provider token set.
    pub const TOKEN_SET: &str = "token_set";

    /// Key for OAuth state (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";

    /// Key for the one-shot feedback banner.
    pub const FEEDBACK: &str = "feedback";

    /// Key for a failed product form draft.
    pub const FORM_REDRAFT: &str = "form_redraft";
}
