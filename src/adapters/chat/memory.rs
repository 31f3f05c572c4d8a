//! In-Memory Chat Adapter
//!
//! Records every send in per-channel history instead of delivering it.
//! This is the adapter the test suite drives conversations through; the
//! history accessors exist for assertions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::adapters::chat::UserDirectory;
use crate::domain::foundation::{Channel, ClientId};
use crate::ports::chat_adapter::{
    AdapterError, ChatAdapter, Identity, MessageContext, User, UserFilter,
};

/// In-memory chat transport for tests and development.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    directory: UserDirectory,
    history: Mutex<HashMap<Channel, Vec<String>>>,
}

impl MemoryAdapter {
    /// Client id used when the context does not carry one.
    pub const CLIENT_ID: &'static str = "MEMORY";
    /// Channel used when the context does not carry one.
    pub const CHANNEL: &'static str = "C1";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    fn history(&self) -> MutexGuard<'_, HashMap<Channel, Vec<String>>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Everything sent on the default channel, in send order.
    pub fn messages(&self) -> Vec<String> {
        self.sent_to(&Channel::from(Self::CHANNEL))
    }

    /// The most recent send on the default channel.
    pub fn last_message(&self) -> Option<String> {
        self.messages().pop()
    }

    /// Everything sent on `channel`, in send order.
    pub fn sent_to(&self, channel: &Channel) -> Vec<String> {
        self.history().get(channel).cloned().unwrap_or_default()
    }

    /// Everything sent to a user's direct-message channel.
    pub fn direct_messages(&self, user: &User) -> Vec<String> {
        self.sent_to(&Channel::from(user.id.as_str()))
    }

    /// The most recent direct message sent to `user`.
    pub fn last_direct_message(&self, user: &User) -> Option<String> {
        self.direct_messages(user).pop()
    }
}

#[async_trait]
impl ChatAdapter for MemoryAdapter {
    fn client_id(&self, identity: Identity<'_>) -> Result<ClientId, AdapterError> {
        match identity {
            Identity::Context(context) => Ok(context
                .client_id
                .clone()
                .unwrap_or_else(|| ClientId::from(Self::CLIENT_ID))),
            Identity::User(user) => Ok(ClientId::from(user.id.as_str())),
        }
    }

    fn channel(&self, identity: Identity<'_>) -> Result<Channel, AdapterError> {
        match identity {
            Identity::Context(context) => Ok(context
                .channel
                .clone()
                .unwrap_or_else(|| Channel::from(Self::CHANNEL))),
            // A user's direct-message channel is keyed by their id.
            Identity::User(user) => Ok(Channel::from(user.id.as_str())),
        }
    }

    fn user_from(&self, context: &MessageContext) -> Option<User> {
        context
            .user_id
            .as_deref()
            .and_then(|id| self.directory.find(id))
    }

    async fn users(&self, filter: UserFilter) -> Result<Vec<User>, AdapterError> {
        Ok(self.directory.list(filter))
    }

    async fn lookup_user(&self, email: &str) -> Result<Option<User>, AdapterError> {
        Ok(self.directory.lookup_by_email(email))
    }

    async fn send(&self, channel: &Channel, text: &str) -> Result<(), AdapterError> {
        self.history()
            .entry(channel.clone())
            .or_default()
            .push(text.to_string());
        Ok(())
    }
}
