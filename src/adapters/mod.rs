//! Adapters: concrete implementations of the engine's ports.

pub mod chat;
pub mod storage;
