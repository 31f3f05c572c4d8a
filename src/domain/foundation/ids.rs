//! Identifier value objects.
//!
//! `ClientId` keys a conversation in storage, `Channel` addresses an
//! outbound destination on the transport, and `StateId` names a unit of
//! conversation behavior. All three serialize as plain strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one conversation across dispatches. Snapshot storage is keyed
/// by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An outbound message destination on the transport (a chat room, a direct
/// message channel, a terminal, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    pub fn new(channel: impl Into<String>) -> Self {
        Self(channel.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(channel: &str) -> Self {
        Self(channel.to_string())
    }
}

impl From<String> for Channel {
    fn from(channel: String) -> Self {
        Self(channel)
    }
}

/// Symbolic identifier of a conversation state.
///
/// The reserved identifier [`StateId::END_OF_CONVERSATION`] marks a finished
/// conversation; a snapshot holding it (or no state id at all) must not be
/// resumed without resetting to the default state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(String);

impl StateId {
    /// Reserved identifier marking a finished conversation.
    pub const END_OF_CONVERSATION: &'static str = "end_of_conversation";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the end sentinel.
    pub fn end() -> Self {
        Self(Self::END_OF_CONVERSATION.to_string())
    }

    /// Returns true if this is the end sentinel.
    pub fn is_end(&self) -> bool {
        self.0 == Self::END_OF_CONVERSATION
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
