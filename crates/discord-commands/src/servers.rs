//! Per-guild server profiles and the table that binds them to guild ids.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use discord_types::{DiscordChannel, DiscordGuild, Emoji};
use tokio::sync::RwLock;

use crate::config::ServerTemplate;

/// Logical channel that receives emoji reports.
pub const MODERATION_CHANNEL: &str = "moderation";
/// Logical emoji that files a report when used as a reaction.
pub const REPORT_EMOJI: &str = "report";
/// Logical emoji shown while a slow command runs.
pub const WORKING_EMOJI: &str = "working";

/// Live bindings for one guild, built on every ready event.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerProfile {
    pub name: String,
    pub guild_id: u64,
    /// False for guilds with no template in the config.
    pub configured: bool,
    pub channels: BTreeMap<String, DiscordChannel>,
    pub emoji: BTreeMap<String, Emoji>,
}

impl ServerProfile {
    /// Resolve a template's channel and emoji names against the guild's
    /// live lists. The first channel or emoji with a matching name wins;
    /// names with no match stay unbound.
    pub fn from_template(
        guild: &DiscordGuild,
        template: &ServerTemplate,
        global_emoji: &BTreeMap<String, String>,
    ) -> Self {
        let channels = template
            .channels
            .iter()
            .filter_map(|(key, wanted)| {
                guild
                    .channels
                    .iter()
                    .find(|ch| ch.name.as_deref() == Some(wanted.as_str()))
                    .map(|ch| (key.clone(), ch.clone()))
            })
            .collect();

        let wanted_emoji = match &template.emoji {
            Some(emoji) => emoji.clone(),
            None => {
                let mut emoji = BTreeMap::from([(
                    WORKING_EMOJI.to_string(),
                    WORKING_EMOJI.to_string(),
                )]);
                emoji.extend(global_emoji.iter().map(|(k, v)| (k.clone(), v.clone())));
                emoji
            }
        };
        let emoji = wanted_emoji
            .iter()
            .filter_map(|(key, wanted)| {
                guild
                    .emojis
                    .iter()
                    .find(|e| &e.name == wanted)
                    .map(|e| (key.clone(), e.clone()))
            })
            .collect();

        Self {
            name: guild.name.clone(),
            guild_id: guild.id,
            configured: true,
            channels,
            emoji,
        }
    }

    /// Minimal profile for a guild missing from the config.
    pub fn unconfigured(guild: &DiscordGuild) -> Self {
        Self {
            name: guild.name.clone(),
            guild_id: guild.id,
            configured: false,
            channels: BTreeMap::new(),
            emoji: BTreeMap::new(),
        }
    }

    pub fn channel(&self, key: &str) -> Option<&DiscordChannel> {
        self.channels.get(key)
    }

    pub fn emoji(&self, key: &str) -> Option<&Emoji> {
        self.emoji.get(key)
    }

    pub fn moderation(&self) -> Option<&DiscordChannel> {
        self.channel(MODERATION_CHANNEL)
    }
}

/// Build the profile for `guild`, synthesizing an unconfigured one when
/// there is no template.
pub fn bind_guild(
    guild: &DiscordGuild,
    template: Option<&ServerTemplate>,
    global_emoji: &BTreeMap<String, String>,
) -> ServerProfile {
    match template {
        Some(template) => ServerProfile::from_template(guild, template, global_emoji),
        None => ServerProfile::unconfigured(guild),
    }
}

/// Guild id -> bound profile. Written only while handling ready events.
#[derive(Debug, Default)]
pub struct ServerTable {
    inner: RwLock<HashMap<u64, Arc<ServerProfile>>>,
}

impl ServerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `profile` to its guild, returning the profile it replaced.
    pub async fn bind(&self, profile: ServerProfile) -> Option<Arc<ServerProfile>> {
        self.inner
            .write()
            .await
            .insert(profile.guild_id, Arc::new(profile))
    }

    pub async fn get(&self, guild_id: u64) -> Option<Arc<ServerProfile>> {
        self.inner.read().await.get(&guild_id).cloned()
    }

    /// Bound guild ids in ascending order.
    pub async fn guild_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.inner.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
