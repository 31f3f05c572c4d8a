//! Foundation value objects shared across the engine.

mod ids;
mod timestamp;

pub use ids::{Channel, ClientId, StateId};
pub use timestamp::Timestamp;
