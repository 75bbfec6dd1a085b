//! Action Dispatcher: minimize, restore, focus and close with ordered
//! fallback chains.

pub mod errors;
pub mod handler;
pub mod types;

pub use errors::ActionError;
pub use handler::ActionDispatcher;
pub use types::{
    ActionOutcome, ActionReport, ActionState, ActionTarget, ActionTier, AttemptFailure,
    WindowAction,
};
