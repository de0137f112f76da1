//! Configuration management for discord-commands

#[path = "config_tests.rs"]
mod config_tests;

use std::collections::BTreeMap;
use std::fs;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Source of environment variables, swappable in tests.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Complete bot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub discord: DiscordBotConfig,
    /// Server templates keyed by guild display name.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerTemplate>,
}

/// Discord bot specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordBotConfig {
    /// Bot token from the Discord developer portal
    #[serde(default)]
    pub token: String,
    /// Name used in the status reply.
    #[serde(default)]
    pub name: Option<String>,
    /// Logical emoji name -> guild emoji name, merged into every server
    /// that does not list its own emoji.
    #[serde(default)]
    pub emoji: BTreeMap<String, String>,
    /// Greet new members when set.
    #[serde(default)]
    pub welcome: Option<WelcomeConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomeConfig {
    /// Logical channel name (key of a server's `channels`) to greet in.
    #[serde(default = "default_welcome_channel")]
    pub channel: String,
    /// `{user}` is replaced with a mention of the new member.
    #[serde(default = "default_welcome_template")]
    pub template: String,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            channel: default_welcome_channel(),
            template: default_welcome_template(),
        }
    }
}

/// Per-guild channel and emoji bindings, resolved by name on ready.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerTemplate {
    /// Logical name -> channel name.
    #[serde(default)]
    pub channels: BTreeMap<String, String>,
    /// Logical name -> emoji name. Replaces the global emoji set entirely.
    #[serde(default)]
    pub emoji: Option<BTreeMap<String, String>>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Load configuration from environment variables. Servers can only be
    /// configured through a file.
    pub fn from_env<E: ReadEnv>(env: &E) -> Result<Self> {
        let token = env
            .var("DISCORD_BOT_TOKEN")
            .context("DISCORD_BOT_TOKEN not set")?;
        let name = env.var("DISCORD_BOT_NAME").filter(|n| !n.trim().is_empty());

        Ok(Config {
            discord: DiscordBotConfig {
                token,
                name,
                ..DiscordBotConfig::default()
            },
            servers: BTreeMap::new(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.discord.token.trim().is_empty() {
            bail!("Discord bot token is empty");
        }
        for (name, server) in &self.servers {
            for (key, channel) in &server.channels {
                if channel.trim().is_empty() {
                    bail!("Server '{}' binds '{}' to an empty channel name", name, key);
                }
            }
        }
        Ok(())
    }
}

fn default_welcome_channel() -> String {
    "welcome".to_string()
}

fn default_welcome_template() -> String {
    "Welcome to the server, {user}! 👋".to_string()
}
