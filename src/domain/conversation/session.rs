//! Ephemeral per-dispatch context.
//!
//! A [`Session`] is created fresh for each dispatch call and discarded after
//! its queues are flushed. It carries the resolved identity plus an outbound
//! message queue per destination channel.

use std::collections::HashMap;

use crate::domain::foundation::{Channel, ClientId};
use crate::ports::chat_adapter::User;

/// Per-dispatch context: resolved identity and pending outbound messages.
#[derive(Debug, Clone)]
pub struct Session {
    client_id: ClientId,
    channel: Channel,
    user: Option<User>,
    messages: HashMap<Channel, Vec<String>>,
}

impl Session {
    pub fn new(client_id: ClientId, channel: Channel, user: Option<User>) -> Self {
        Self {
            client_id,
            channel,
            user,
            messages: HashMap::new(),
        }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// The channel the inbound message arrived on; replies go here unless a
    /// state addresses another destination.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Appends a message to a channel's pending queue.
    pub fn queue(&mut self, channel: &Channel, message: impl Into<String>) {
        self.messages
            .entry(channel.clone())
            .or_default()
            .push(message.into());
    }

    /// The pending messages for one channel, in queue order.
    pub fn queued(&self, channel: &Channel) -> &[String] {
        self.messages.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when no channel has pending messages.
    pub fn is_empty(&self) -> bool {
        self.messages.values().all(Vec::is_empty)
    }

    /// Removes and returns the pending queues, either for one channel or for
    /// every channel with queued messages. Order within a channel is
    /// preserved; channels are independent of one another.
    pub fn drain(&mut self, channel: Option<&Channel>) -> Vec<(Channel, Vec<String>)> {
        match channel {
            Some(channel) => self
                .messages
                .remove(channel)
                .filter(|queue| !queue.is_empty())
                .map(|queue| vec![(channel.clone(), queue)])
                .unwrap_or_default(),
            None => self
                .messages
                .drain()
                .filter(|(_, queue)| !queue.is_empty())
                .collect(),
        }
    }
}
