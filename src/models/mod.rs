//! Domain models for the console.

pub mod ids;
pub mod session;

pub use ids::{OrderId, ProductId};
pub use session::{
    Feedback, FormRedraft, ProductDraft, keys as session_keys, set_feedback, stash_redraft,
    take_feedback, take_redraft,
};
