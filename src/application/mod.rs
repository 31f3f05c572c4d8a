//! Application layer: orchestrates ports and domain into dispatch cycles.

mod dispatcher;

pub use dispatcher::{DispatchError, Dispatcher};
