//! Discord command bot
//!
//! Connects to the Discord gateway and dispatches chat commands to the
//! handlers registered on [`Bot`].

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serenity::model::gateway::GatewayIntents;
use serenity::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use discord_commands::config::{Config, SystemEnv};
use discord_commands::handlers::Handler;
use discord_commands::health::{self, AppState};
use discord_commands::{errors, Bot, SerenityPlatform};

/// Discord command bot CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/discord-commands.toml")]
    config: String,

    /// Discord bot token (overrides config file)
    #[arg(long, env = "DISCORD_BOT_TOKEN")]
    bot_token: Option<String>,

    /// Name used in the status reply (overrides config file)
    #[arg(long, env = "DISCORD_BOT_NAME")]
    name: Option<String>,

    /// Health check server port
    #[arg(long, env = "HEALTH_CHECK_PORT", default_value = "3001")]
    health_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "discord_commands=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Discord command bot");

    let args = Args::parse();

    let mut config = if std::path::Path::new(&args.config).exists() {
        info!("Loading config from file: {}", args.config);
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, loading from environment");
        Config::from_env(&SystemEnv)?
    };
    if let Some(bot_token) = args.bot_token {
        config.discord.token = bot_token;
    }
    if let Some(name) = args.name {
        config.discord.name = Some(name);
    }
    config.validate()?;

    info!(
        "Configured servers: {:?}",
        config.servers.keys().collect::<Vec<_>>()
    );

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::GUILD_EMOJIS_AND_STICKERS
        | GatewayIntents::MESSAGE_CONTENT;

    let token = config.discord.token.clone();
    let mut client = Client::builder(&token, intents)
        .event_handler(Handler)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Discord client: {}", e))?;

    let platform = Arc::new(SerenityPlatform::new(client.http.clone()));
    let bot = Arc::new(Bot::new(config, platform));
    info!(
        "Registered commands: {:?}",
        bot.commands().names().collect::<Vec<_>>()
    );

    let health_state = AppState::new();

    {
        let mut data = client.data.write().await;
        data.insert::<Bot>(bot.clone());
        data.insert::<AppState>(health_state.clone());
    }

    let health_port = args.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::start_health_server(health_state, health_port).await {
            error!("Health server error: {}", e);
        }
    });

    // Graceful shutdown: close all shards on SIGTERM or Ctrl+C.
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.ok();
        }
        info!("Shutdown signal received, stopping Discord client...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting Discord gateway connection...");

    // Blocks until all shards are stopped
    if let Err(e) = client.start().await {
        bot.client_error(errors::client_error_event(&e)).await;
        return Err(anyhow::anyhow!("Discord client error: {}", e));
    }

    info!("Discord bot stopped");
    Ok(())
}
