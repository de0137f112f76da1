//! # discord-commands
//!
//! Text-command dispatch for a Discord bot.
//!
//! ## Features
//!
//! - Chat messages such as `status` or `/kick bob "spamming links"` are
//!   matched against registered commands by their usage pattern.
//! - Direct messages get usage help and "did you mean" suggestions.
//! - Per-guild channel and emoji bindings, resolved by name on every ready.
//! - Reacting with the configured `report` emoji forwards the message to
//!   the moderation channel.
//! - Optional greeting for new members.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use discord_commands::commands::{CommandContext, CommandDescriptor, CommandInput};
//! use discord_commands::{Bot, Config, SerenityPlatform};
//! use serenity::http::Http;
//!
//! # fn demo(config: Config) {
//! let http = Arc::new(Http::new(&config.discord.token));
//! let mut bot = Bot::new(config, Arc::new(SerenityPlatform::new(http)));
//! bot.register(
//!     "ping",
//!     CommandDescriptor::new("ping", "Check round-trip", |ctx: CommandContext, _: CommandInput| async move {
//!         ctx.reply("pong").await
//!     }),
//! );
//! let bot = Arc::new(bot);
//! # let _ = bot;
//! # }
//! ```
//!
//! ## Config example
//!
//! ```toml
//! [discord]
//! token = "..."
//! name = "Bot"
//!
//! [discord.emoji]
//! report = "redflag"
//!
//! [servers.Guild1.channels]
//! moderation = "mod-queue"
//! welcome = "lobby"
//! ```

pub mod bot;
pub mod bridge;
pub mod cmdline;
pub mod commands;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod platform;
pub mod router;
pub mod servers;
pub mod util;

pub use bot::Bot;
pub use config::Config;
pub use platform::{Platform, SerenityPlatform};
