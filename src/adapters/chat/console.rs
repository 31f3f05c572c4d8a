//! Console Chat Adapter
//!
//! Prints outbound messages to stdout with an ANSI-colored channel prefix.
//! There is a single console "client", so every dispatch shares one
//! conversation key.

use async_trait::async_trait;

use crate::adapters::chat::UserDirectory;
use crate::domain::foundation::{Channel, ClientId};
use crate::ports::chat_adapter::{
    AdapterError, ChatAdapter, Identity, MessageContext, User, UserFilter,
};

/// Chat transport that writes to the terminal.
#[derive(Debug)]
pub struct ConsoleAdapter {
    name: String,
    directory: UserDirectory,
}

impl ConsoleAdapter {
    /// Client id shared by every console conversation.
    pub const CLIENT_ID: &'static str = "CONSOLE";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directory: UserDirectory::new(),
        }
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    fn display_channel(user: &User) -> Channel {
        let label = user.name.as_deref().unwrap_or(user.id.as_str());
        Channel::from(label.to_uppercase())
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new("@colloquy")
    }
}

#[async_trait]
impl ChatAdapter for ConsoleAdapter {
    fn client_id(&self, _identity: Identity<'_>) -> Result<ClientId, AdapterError> {
        Ok(ClientId::from(Self::CLIENT_ID))
    }

    fn channel(&self, identity: Identity<'_>) -> Result<Channel, AdapterError> {
        match identity {
            Identity::Context(context) => Ok(context
                .channel
                .clone()
                .unwrap_or_else(|| Channel::from(self.name.as_str()))),
            Identity::User(user) => Ok(Self::display_channel(user)),
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
        println!("\n\x1b[34;1m{channel}\x1b[0m: {text}");
        Ok(())
    }
}
