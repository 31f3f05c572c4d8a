//! Chat Adapter Port - the transport boundary.
//!
//! An adapter resolves client/channel identity from an inbound context,
//! performs user lookups, and owns the transport-specific `send` primitive.
//! Message queueing and flushing are provided here so every transport
//! batches output the same way: one send per channel per flush, messages
//! joined by a blank line.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::Session;
use crate::domain::foundation::{Channel, ClientId};

/// Errors raised at the transport boundary.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("context does not identify a client")]
    UnresolvedClient,

    #[error("context does not identify a channel")]
    UnresolvedChannel,

    #[error("transport error: {0}")]
    Transport(String),
}

/// A user known to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub tz_offset: i32,
    pub profile: Option<Profile>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            tz_offset: 0,
            profile: None,
            deleted: false,
            is_bot: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// First and last name from the profile, or an empty string.
    pub fn real_name(&self) -> String {
        match &self.profile {
            None => String::new(),
            Some(profile) => format!("{} {}", profile.first_name, profile.last_name),
        }
    }
}

/// Profile details attached to a [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl Profile {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email,
        }
    }
}

/// Filter for directory listings. Defaults exclude deleted users and bots.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFilter {
    pub include_deleted: bool,
    pub include_bots: bool,
}

/// The transport-specific context an inbound message arrived with.
///
/// Adapters decide how much of it they need; the in-memory and console
/// adapters fall back to fixed identities when fields are absent.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    pub client_id: Option<ClientId>,
    pub channel: Option<Channel>,
    pub user_id: Option<String>,
}

impl MessageContext {
    pub fn with_client_id(mut self, client_id: impl Into<ClientId>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<Channel>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// What identity resolution starts from: an inbound message context, or a
/// directory user (when the engine reaches out first).
#[derive(Debug, Clone, Copy)]
pub enum Identity<'a> {
    Context(&'a MessageContext),
    User(&'a User),
}

/// Port for chat transports.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Resolves the conversation key for this identity.
    fn client_id(&self, identity: Identity<'_>) -> Result<ClientId, AdapterError>;

    /// Resolves the outbound channel for this identity. For a
    /// [`Identity::User`] this is the user's direct-message channel.
    fn channel(&self, identity: Identity<'_>) -> Result<Channel, AdapterError>;

    /// The user the context belongs to, if the transport knows one.
    fn user_from(&self, context: &MessageContext) -> Option<User>;

    /// Lists known users, subject to `filter`.
    async fn users(&self, filter: UserFilter) -> Result<Vec<User>, AdapterError>;

    /// Finds a user by email address.
    async fn lookup_user(&self, email: &str) -> Result<Option<User>, AdapterError>;

    /// Transport primitive: deliver one text to one channel. Invoked only by
    /// [`ChatAdapter::flush_session`].
    async fn send(&self, channel: &Channel, text: &str) -> Result<(), AdapterError>;

    /// Queues `text` on the session's current channel, optionally flushing
    /// that channel immediately.
    async fn queue_message(
        &self,
        session: &mut Session,
        text: &str,
        send_now: bool,
    ) -> Result<(), AdapterError> {
        let channel = session.channel().clone();
        session.queue(&channel, text);

        if send_now {
            self.flush_session(session, Some(&channel)).await?;
        }
        Ok(())
    }

    /// Queues `text` on the recipient's direct-message channel.
    fn queue_direct_message(
        &self,
        session: &mut Session,
        text: &str,
        recipient: &User,
    ) -> Result<(), AdapterError> {
        let channel = self.channel(Identity::User(recipient))?;
        session.queue(&channel, text);
        Ok(())
    }

    /// Sends and clears pending messages, either for one channel or for all
    /// channels with queued output. Each channel's queue is concatenated
    /// with a blank-line separator into exactly one send.
    async fn flush_session(
        &self,
        session: &mut Session,
        channel: Option<&Channel>,
    ) -> Result<(), AdapterError> {
        for (channel, queued) in session.drain(channel) {
            self.send(&channel, &queued.join("\n\n")).await?;
        }
        Ok(())
    }
}

/// Filters a user list the way adapters backed by a directory do.
pub(crate) fn apply_filter(users: &HashMap<String, User>, filter: UserFilter) -> Vec<User> {
    let mut matched: Vec<User> = users
        .values()
        .filter(|user| filter.include_deleted || !user.deleted)
        .filter(|user| filter.include_bots || !user.is_bot)
        .cloned()
        .collect();
    matched.sort_by(|a, b| a.id.cmp(&b.id));
    matched
}
