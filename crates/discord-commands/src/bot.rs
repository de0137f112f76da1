//! The bot instance: configuration, commands, server bindings and the
//! outbound platform, shared by every event handler.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use serenity::prelude::TypeMapKey;
use tracing::error;

use crate::commands::{
    status_command, welcome_command, CommandDescriptor, CommandRegistry, Sentinel,
};
use crate::config::Config;
use crate::errors;
use crate::platform::Platform;
use crate::servers::{ServerProfile, ServerTable};
use crate::util::DisplayName;

pub struct Bot {
    config: Config,
    platform: Arc<dyn Platform>,
    commands: CommandRegistry,
    servers: ServerTable,
    /// Own user id, 0 until the first ready event.
    user_id: AtomicU64,
}

impl Bot {
    /// Builds a bot with the built-in `status` command, and the welcome
    /// greeter when the config asks for one.
    pub fn new(config: Config, platform: Arc<dyn Platform>) -> Self {
        let mut commands = CommandRegistry::new();
        commands.register("status", status_command());
        if let Some(welcome) = config.discord.welcome.clone() {
            commands.register_sentinel(Sentinel::Welcome, welcome_command(welcome));
        }

        Self {
            config,
            platform,
            commands,
            servers: ServerTable::new(),
            user_id: AtomicU64::new(0),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, descriptor: CommandDescriptor) {
        self.commands.register(name, descriptor);
    }

    pub fn register_sentinel(&mut self, sentinel: Sentinel, descriptor: CommandDescriptor) {
        self.commands.register_sentinel(sentinel, descriptor);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn servers(&self) -> &ServerTable {
        &self.servers
    }

    pub fn user_id(&self) -> Option<u64> {
        match self.user_id.load(Ordering::Acquire) {
            0 => None,
            id => Some(id),
        }
    }

    pub(crate) fn set_user_id(&self, id: u64) {
        self.user_id.store(id, Ordering::Release);
    }

    pub(crate) fn is_self(&self, user_id: u64) -> bool {
        self.user_id() == Some(user_id)
    }

    /// Liveness text for the `status` command.
    pub fn status(&self, server: Option<&ServerProfile>) -> String {
        let mut status = match &self.config.discord.name {
            Some(name) => format!("{} is alive!", name),
            None => "I am alive!".to_string(),
        };
        if let Some(server) = server {
            status.push_str(&format!("\nYour server is {}", server.display_name()));
        }
        status
    }

    /// Run an event handler, logging instead of propagating its error.
    pub async fn guarded<F>(&self, name: &str, handler: F)
    where
        F: Future<Output = Result<()>>,
    {
        if let Err(err) = handler.await {
            let context = format!("Error running {}", name);
            match err.downcast_ref::<serenity::Error>() {
                Some(serenity_err) => errors::log_error(name, &context, serenity_err),
                None => error!("{}: {:#}", context, err),
            }
        }
    }
}

impl TypeMapKey for Bot {
    type Value = Arc<Bot>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandContext, CommandInput};
    use crate::config::{DiscordBotConfig, WelcomeConfig};
    use crate::platform::MockPlatform;
    use std::collections::BTreeMap;

    fn config(name: Option<&str>) -> Config {
        Config {
            discord: DiscordBotConfig {
                token: "tok".to_string(),
                name: name.map(String::from),
                ..DiscordBotConfig::default()
            },
            servers: BTreeMap::new(),
        }
    }

    fn profile(name: &str) -> ServerProfile {
        ServerProfile {
            name: name.to_string(),
            guild_id: 1,
            configured: true,
            channels: BTreeMap::new(),
            emoji: BTreeMap::new(),
        }
    }

    #[test]
    fn test_new_registers_status_only() {
        let bot = Bot::new(config(None), Arc::new(MockPlatform::new()));
        assert!(bot.commands().get("status").is_some());
        assert_eq!(bot.commands().len(), 1);
        assert!(bot.commands().sentinel(Sentinel::Welcome).is_none());
        assert!(bot.commands().sentinel(Sentinel::Default).is_none());
    }

    #[test]
    fn test_new_registers_welcome_when_configured() {
        let mut cfg = config(None);
        cfg.discord.welcome = Some(WelcomeConfig::default());
        let bot = Bot::new(cfg, Arc::new(MockPlatform::new()));
        assert!(bot.commands().sentinel(Sentinel::Welcome).is_some());
    }

    #[test]
    fn test_register_overwrites() {
        let mut bot = Bot::new(config(None), Arc::new(MockPlatform::new()));
        bot.register(
            "status",
            CommandDescriptor::new("status", "replaced", |_ctx: CommandContext, _input: CommandInput| async {
                anyhow::Ok(())
            }),
        );
        assert_eq!(bot.commands().get("status").unwrap().description, "replaced");
        assert_eq!(bot.commands().len(), 1);
    }

    #[test]
    fn test_status_text() {
        let named = Bot::new(config(Some("Bot")), Arc::new(MockPlatform::new()));
        assert_eq!(named.status(None), "Bot is alive!");
        assert_eq!(
            named.status(Some(&profile("Guild1"))),
            "Bot is alive!\nYour server is Guild1"
        );

        let anonymous = Bot::new(config(None), Arc::new(MockPlatform::new()));
        assert_eq!(anonymous.status(None), "I am alive!");
    }

    #[test]
    fn test_user_id_unset_until_ready() {
        let bot = Bot::new(config(None), Arc::new(MockPlatform::new()));
        assert_eq!(bot.user_id(), None);
        assert!(!bot.is_self(7));
        bot.set_user_id(7);
        assert_eq!(bot.user_id(), Some(7));
        assert!(bot.is_self(7));
    }

    #[tokio::test]
    async fn test_guarded_swallows_errors() {
        let bot = Bot::new(config(None), Arc::new(MockPlatform::new()));
        bot.guarded("client_message", async { Err::<(), _>(anyhow::anyhow!("boom")) })
            .await;
        bot.guarded("client_message", async { anyhow::Ok(()) }).await;
    }
}
