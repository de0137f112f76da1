//! Core Discord domain types

use serde::{Deserialize, Serialize};

/// Discord user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordUser {
    pub id: u64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    /// Legacy four-digit discriminator; `None` for migrated usernames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<u16>,
    pub bot: bool,
}

impl DiscordUser {
    /// `username#1234`, or the bare username when there is no discriminator.
    pub fn tag(&self) -> String {
        match self.discriminator {
            Some(d) => format!("{}#{:04}", self.username, d),
            None => self.username.clone(),
        }
    }

    /// Mention markup (`<@id>`), rendered by clients as a highlighted name.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// Channel type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildNews,
    GuildStageVoice,
    GuildForum,
    Unknown,
}

/// Discord channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordChannel {
    pub id: u64,
    pub channel_type: ChannelType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DiscordChannel {
    /// Mention markup (`<#id>`).
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

/// Custom or unicode emoji
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Emoji {
    /// Custom emoji id; `None` for unicode emoji.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub animated: bool,
}

impl Emoji {
    /// True when both are custom emoji with the same id.
    pub fn same_custom_emoji(&self, other: &Emoji) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

/// Discord guild (server) as seen on connect: its live channels and emoji.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordGuild {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub channels: Vec<DiscordChannel>,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
}

/// Discord guild member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordMember {
    pub user: DiscordUser,
    pub guild_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<u64>,
}

/// Message attachment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub id: u64,
    pub filename: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size: u64,
}

/// Discord message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordMessage {
    pub id: u64,
    pub channel_id: u64,
    /// `None` for direct messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,
    pub author: DiscordUser,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl DiscordMessage {
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(discriminator: Option<u16>) -> DiscordUser {
        DiscordUser {
            id: 42,
            username: "alice".to_string(),
            global_name: None,
            discriminator,
            bot: false,
        }
    }

    #[test]
    fn test_user_tag_with_discriminator() {
        assert_eq!(user(Some(7)).tag(), "alice#0007");
        assert_eq!(user(Some(1234)).tag(), "alice#1234");
    }

    #[test]
    fn test_user_tag_without_discriminator() {
        assert_eq!(user(None).tag(), "alice");
    }

    #[test]
    fn test_mentions() {
        assert_eq!(user(None).mention(), "<@42>");
        let channel = DiscordChannel {
            id: 9,
            channel_type: ChannelType::GuildText,
            guild_id: Some(1),
            name: Some("general".to_string()),
        };
        assert_eq!(channel.mention(), "<#9>");
    }

    #[test]
    fn test_same_custom_emoji() {
        let report = Emoji {
            id: Some(5),
            name: "report".to_string(),
            animated: false,
        };
        let renamed = Emoji {
            name: "flag".to_string(),
            ..report.clone()
        };
        let unicode = Emoji {
            id: None,
            name: "report".to_string(),
            animated: false,
        };
        assert!(report.same_custom_emoji(&renamed));
        assert!(!report.same_custom_emoji(&unicode));
        assert!(!unicode.same_custom_emoji(&unicode));
    }

    #[test]
    fn test_channel_type_serde() {
        for (t, expected) in [
            (ChannelType::GuildText, "\"guild_text\""),
            (ChannelType::Dm, "\"dm\""),
            (ChannelType::GuildVoice, "\"guild_voice\""),
        ] {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, expected);
            let back: ChannelType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, t);
        }
    }

    #[test]
    fn test_message_defaults_when_fields_missing() {
        let msg: DiscordMessage = serde_json::from_value(serde_json::json!({
            "id": 1,
            "channel_id": 100,
            "author": {"id": 42, "username": "alice", "bot": false},
            "content": "status"
        }))
        .unwrap();
        assert!(msg.is_direct());
        assert!(msg.attachments.is_empty());
        assert_eq!(msg.author.discriminator, None);
    }
}
