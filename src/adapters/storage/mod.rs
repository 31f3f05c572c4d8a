//! Snapshot storage backends.

mod in_memory;
mod redis;

pub use in_memory::InMemoryStorage;
pub use redis::RedisStorage;
