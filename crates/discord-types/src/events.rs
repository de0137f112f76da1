//! Inbound gateway events, normalized away from the SDK's own models

use serde::{Deserialize, Serialize};

use crate::errors::ClientErrorCode;
use crate::types::{DiscordChannel, DiscordGuild, DiscordMember, DiscordMessage, DiscordUser, Emoji};

/// The gateway session is ready (initial connect and every reconnect).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadyEvent {
    /// The bot's own user.
    pub user: DiscordUser,
    /// Every guild the bot is currently a member of.
    pub guilds: Vec<DiscordGuild>,
}

/// A new message was created in a channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageCreatedEvent {
    pub message: DiscordMessage,
}

/// A reaction was added to a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReactionAddEvent {
    /// The user who reacted.
    pub user: DiscordUser,
    /// The channel the reacted message lives in.
    pub channel: DiscordChannel,
    /// The reacted message.
    pub message: DiscordMessage,
    pub emoji: Emoji,
    /// `None` when the reaction happened in a direct message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,
}

/// A user joined a guild
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuildMemberAddEvent {
    pub guild_id: u64,
    pub member: DiscordMember,
}

/// The client reported a connection-level error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientErrorEvent {
    pub code: ClientErrorCode,
    pub message: String,
}

impl ClientErrorEvent {
    pub fn new(code: ClientErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
