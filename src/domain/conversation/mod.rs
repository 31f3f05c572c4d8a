//! Conversation snapshot model.
//!
//! [`StateData`] is the persisted snapshot of one conversation; [`Session`]
//! is the ephemeral per-dispatch context with its outbound message queues.

mod session;
mod state;
mod state_data;

pub use session::Session;
pub use state::{ConversationState, StateError, StepContext};
pub use state_data::{StateAction, StateData, StateDataError};
