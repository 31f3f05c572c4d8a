//! Ports: the contracts the engine consumes, implemented by adapters.

pub mod chat_adapter;
pub mod snapshot_storage;
pub mod state_factory;

pub use chat_adapter::{
    AdapterError, ChatAdapter, Identity, MessageContext, Profile, User, UserFilter,
};
pub use snapshot_storage::{SnapshotRepository, SnapshotStorage, StorageError};
pub use state_factory::{EntryPoint, FactoryError, StateFactory, StateRegistry};
