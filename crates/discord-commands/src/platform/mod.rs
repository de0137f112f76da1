//! Outbound port: every side effect the router performs against Discord.
//!
//! Implemented by [`SerenityPlatform`] (real HTTP) and, for tests,
//! [`MockPlatform`] (in-memory recorder).

#[cfg(any(test, feature = "test-support"))]
pub mod mock;
pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use discord_types::{Attachment, DiscordMember, DiscordMessage, Emoji};

#[cfg(any(test, feature = "test-support"))]
pub use mock::{MockPlatform, PlatformCall};
pub use http::SerenityPlatform;

/// Discord's hard limit on message content length.
pub const MESSAGE_LIMIT: usize = 2000;

/// Rich embed attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutgoingEmbed {
    /// Name shown in the embed's author line.
    pub author: Option<String>,
    /// Files re-uploaded alongside the embed.
    pub files: Vec<Attachment>,
}

/// Message to post in a channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutgoingMessage {
    pub content: String,
    /// Split content over several messages when it exceeds [`MESSAGE_LIMIT`].
    pub split: bool,
    pub embed: Option<OutgoingEmbed>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn split(mut self) -> Self {
        self.split = true;
        self
    }

    pub fn with_embed(mut self, embed: Option<OutgoingEmbed>) -> Self {
        self.embed = embed;
        self
    }
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Reply inline to `message` in its own channel.
    async fn reply(&self, message: &DiscordMessage, content: &str) -> Result<()>;

    async fn send_message(&self, channel_id: u64, message: OutgoingMessage) -> Result<()>;

    async fn react(&self, channel_id: u64, message_id: u64, emoji: &Emoji) -> Result<()>;

    /// Remove the reaction `user_id` added with `emoji`.
    async fn remove_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        user_id: u64,
        emoji: &Emoji,
    ) -> Result<()>;

    /// Remove the bot's own reaction.
    async fn remove_own_reaction(&self, channel_id: u64, message_id: u64, emoji: &Emoji)
        -> Result<()>;

    /// Fetch or open the private channel with `user_id`, returning its id.
    async fn create_dm_channel(&self, user_id: u64) -> Result<u64>;

    /// Errors when the user is not a member of the guild (or the lookup fails).
    async fn fetch_member(&self, guild_id: u64, user_id: u64) -> Result<DiscordMember>;
}
