//! Domain layer: the conversation snapshot model and its value objects.

pub mod conversation;
pub mod foundation;
