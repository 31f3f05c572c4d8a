//! Chat transport adapters.
//!
//! `ConsoleAdapter` writes to the terminal; `MemoryAdapter` records sends
//! in memory and is the test double used throughout the test suite. Both
//! are backed by a [`UserDirectory`] stub so user lookups work without a
//! real chat service.

mod console;
mod directory;
mod memory;

pub use console::ConsoleAdapter;
pub use directory::UserDirectory;
pub use memory::MemoryAdapter;
