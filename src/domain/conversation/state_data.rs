//! Persisted snapshot of a single conversation.
//!
//! Between dispatches a conversation exists only as a serialized
//! [`StateData`]: the current state identifier, the pending action, a
//! key/value payload carried across steps, the set of one-time-read keys,
//! and the time of the last successful persist.

use std::collections::{HashMap, HashSet};

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{StateId, Timestamp};

/// Errors raised by payload accessors.
#[derive(Debug, thiserror::Error)]
pub enum StateDataError {
    #[error("cannot overwrite key '{0}' with a temporary value")]
    TemporaryOverwrite(String),

    #[error("failed to encode payload value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode payload value for key '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Which operation a state runs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateAction {
    /// Emit output.
    Ask,
    /// Wait for and interpret one user input.
    Listen,
    /// The conversation is over.
    #[serde(rename = "end_of_conversation")]
    End,
}

impl StateAction {
    /// The other half of the ask/listen pair. `End` has no counterpart.
    pub fn flipped(&self) -> Self {
        match self {
            StateAction::Ask => StateAction::Listen,
            StateAction::Listen => StateAction::Ask,
            StateAction::End => StateAction::End,
        }
    }
}

/// The persisted snapshot of a single conversation.
///
/// Owned by storage between dispatches and by the active state during one.
/// Round-trip serializable; `last_interacted_at` is refreshed by
/// [`StateData::reset_elapsed_time`] at persist time rather than preserved
/// verbatim by serialization alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateData {
    state_id: Option<StateId>,
    state_action: Option<StateAction>,
    #[serde(default)]
    payload: HashMap<String, Value>,
    #[serde(default)]
    temporary_keys: HashSet<String>,
    #[serde(default)]
    last_interacted_at: Option<Timestamp>,
}

impl StateData {
    /// Creates an empty snapshot: no active conversation, no payload.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_id(&self) -> Option<&StateId> {
        self.state_id.as_ref()
    }

    pub fn state_action(&self) -> Option<StateAction> {
        self.state_action
    }

    /// Overwrites the current state identifier and pending action.
    pub fn set_state(&mut self, state_id: Option<StateId>, action: Option<StateAction>) {
        self.state_id = state_id;
        self.state_action = action;
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.payload.keys().map(String::as_str)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.payload.contains_key(key)
    }

    pub fn has_temporary_key(&self, key: &str) -> bool {
        self.temporary_keys.contains(key)
    }

    /// Returns the value stored under `key`.
    ///
    /// Keys marked temporary are removed by this read (one-time-read
    /// semantics); regular keys remain in place.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.read(key, false)
    }

    /// Returns the value stored under `key` and removes it.
    pub fn get_clear(&mut self, key: &str) -> Option<Value> {
        self.read(key, true)
    }

    /// Returns the value under `key` decoded into `T`.
    ///
    /// Follows the same removal rules as [`StateData::get`].
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, StateDataError> {
        match self.read(key, false) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StateDataError::Decode { key: key.to_string(), source }),
        }
    }

    fn read(&mut self, key: &str, clear: bool) -> Option<Value> {
        if self.temporary_keys.remove(key) || clear {
            self.temporary_keys.remove(key);
            self.payload.remove(key)
        } else {
            self.payload.get(key).cloned()
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.payload.insert(key.into(), value);
    }

    /// Serializes `value` and stores it under `key`.
    pub fn set_value<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), StateDataError> {
        let key = key.into();
        let value = serde_json::to_value(value)
            .map_err(|source| StateDataError::Encode { key: key.clone(), source })?;
        self.payload.insert(key, value);
        Ok(())
    }

    /// Stores a value that is removed the first time it is read.
    ///
    /// Fails if a non-temporary value already occupies `key`.
    pub fn set_temporary(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), StateDataError> {
        let key = key.into();
        if self.payload.contains_key(&key) && !self.temporary_keys.contains(&key) {
            return Err(StateDataError::TemporaryOverwrite(key));
        }

        self.payload.insert(key.clone(), value);
        self.temporary_keys.insert(key);
        Ok(())
    }

    /// Merges `other` into the payload, overwriting on conflicting keys.
    pub fn merge(&mut self, other: impl IntoIterator<Item = (String, Value)>) {
        self.payload.extend(other);
    }

    /// Removes one key and its temporary marker.
    pub fn clear_key(&mut self, key: &str) {
        self.payload.remove(key);
        self.temporary_keys.remove(key);
    }

    /// Removes the entire payload and all temporary markers.
    pub fn clear(&mut self) {
        self.payload.clear();
        self.temporary_keys.clear();
    }

    /// True iff no conversation is active: the state id is unset or the end
    /// sentinel.
    pub fn finished(&self) -> bool {
        match &self.state_id {
            None => true,
            Some(id) => id.is_end(),
        }
    }

    /// True iff the last interaction is older than `timeout`.
    ///
    /// A snapshot that has never been persisted cannot expire.
    pub fn expired(&self, timeout: Duration) -> bool {
        match &self.last_interacted_at {
            None => false,
            Some(ts) => Timestamp::now().duration_since(ts) > timeout,
        }
    }

    pub fn last_interacted_at(&self) -> Option<Timestamp> {
        self.last_interacted_at
    }

    /// Stamps the last-interaction time. Called exactly once per successful
    /// persist.
    pub fn reset_elapsed_time(&mut self) {
        self.last_interacted_at = Some(Timestamp::now());
    }
}
