//! Gateway event routing: the five entry points the serenity handler
//! calls, and the dispatch of chat text to registered commands.

#[path = "router_tests.rs"]
mod router_tests;

use std::sync::Arc;

use anyhow::{Context, Result};
use discord_types::{
    ClientErrorEvent, Emoji, GuildMemberAddEvent, MessageCreatedEvent, ReactionAddEvent,
    ReadyEvent,
};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::bot::Bot;
use crate::cmdline::{strip_command_prefix, CommandLine};
use crate::commands::{CommandContext, CommandInput, Sentinel, Trigger};
use crate::platform::{OutgoingEmbed, OutgoingMessage};
use crate::servers::{bind_guild, ServerProfile, REPORT_EMOJI};
use crate::util::DisplayName;

/// Sent to a DM author whose server could not be worked out.
pub const UNRESOLVED_SERVER_NOTICE: &str = "We were unable to determine exactly one server associated with you and this bot, the DM interface will be limited.";

impl Bot {
    /// Called at startup and after every reconnect.
    pub async fn client_ready(&self, event: ReadyEvent) {
        self.guarded("client_ready", self.on_ready(event)).await
    }

    pub async fn client_error(&self, event: ClientErrorEvent) {
        self.guarded("client_error", self.on_error(event)).await
    }

    pub async fn client_message(self: &Arc<Self>, event: MessageCreatedEvent) {
        self.guarded("client_message", self.on_message(event)).await
    }

    pub async fn client_reaction_add(self: &Arc<Self>, event: ReactionAddEvent) {
        self.guarded("client_reaction_add", self.on_reaction_add(event))
            .await
    }

    pub async fn client_member_add(self: &Arc<Self>, event: GuildMemberAddEvent) {
        self.guarded("client_member_add", self.on_member_add(event))
            .await
    }

    async fn on_ready(&self, event: ReadyEvent) -> Result<()> {
        self.set_user_id(event.user.id);
        info!("Logged in as {}!", event.user.tag());

        for guild in &event.guilds {
            info!("Logged into {}, {}", guild.name, guild.id);
            let template = self.config().servers.get(&guild.name);
            if template.is_none() {
                warn!("Unknown server: {}", guild.name);
            }
            let profile = bind_guild(guild, template, &self.config().discord.emoji);
            debug!(
                "Bound {} with channels {:?} and emoji {:?}",
                profile.name,
                profile.channels.keys().collect::<Vec<_>>(),
                profile.emoji.keys().collect::<Vec<_>>()
            );
            self.servers().bind(profile).await;
        }
        Ok(())
    }

    async fn on_error(&self, event: ClientErrorEvent) -> Result<()> {
        if event.code.is_transient() {
            info!("Reconnecting…");
        } else {
            error!("{}", serde_json::to_string(&event)?);
        }
        Ok(())
    }

    async fn on_message(self: &Arc<Self>, event: MessageCreatedEvent) -> Result<()> {
        let message = event.message;
        if self.is_self(message.author.id) {
            return Ok(());
        }

        let cmdline = strip_command_prefix(message.content.trim()).to_string();

        let server = match message.guild_id {
            Some(guild_id) => self.servers().get(guild_id).await,
            None => self.resolve_dm_server(message.author.id).await,
        };

        if server.is_none() && message.is_direct() {
            if let Err(e) = self
                .send_dm(message.author.id, UNRESOLVED_SERVER_NOTICE)
                .await
            {
                warn!(
                    "Failed to notify {} about unresolved server: {:#}",
                    message.author.display_name(),
                    e
                );
            }
        }

        let ctx = CommandContext {
            trigger: Trigger::Message(message),
            server,
            bot: self.clone(),
        };
        self.dispatch(ctx, &cmdline).await
    }

    /// A DM carries no guild, so find the single bound guild the author
    /// belongs to. Lookup failures count as "not a member".
    async fn resolve_dm_server(&self, user_id: u64) -> Option<Arc<ServerProfile>> {
        let guild_ids = self.servers().guild_ids().await;
        let probes = guild_ids.iter().map(|&guild_id| async move {
            match self.platform().fetch_member(guild_id, user_id).await {
                Ok(_) => Some(guild_id),
                Err(e) => {
                    debug!("User {} not found in guild {}: {:#}", user_id, guild_id, e);
                    None
                }
            }
        });
        let found: Vec<u64> = join_all(probes).await.into_iter().flatten().collect();

        match found.as_slice() {
            [guild_id] => self.servers().get(*guild_id).await,
            _ => {
                debug!(
                    "User {} shares {} guilds with the bot",
                    user_id,
                    found.len()
                );
                None
            }
        }
    }

    /// Match `cmdline` against the commands eligible in `ctx` and run the
    /// result.
    pub async fn dispatch(self: &Arc<Self>, ctx: CommandContext, cmdline: &str) -> Result<()> {
        let direct = ctx.is_direct();

        let mut parser = CommandLine::new();
        for (name, cmd) in self.commands().eligible(&ctx) {
            parser = parser.command(name, &cmd.usage, &cmd.description);
        }
        if direct {
            parser = parser.demand_command().recommend_commands();
        }

        let outcome = parser.parse(cmdline);
        if let Some(output) = outcome.output {
            return ctx.reply(&output).await;
        }

        let matched = outcome
            .args
            .command
            .as_deref()
            .and_then(|name| self.commands().get(name));
        if let Some(cmd) = matched {
            debug!("Running command {:?}", outcome.args.command);
            return cmd.run(ctx, CommandInput::Parsed(outcome.args)).await;
        }

        if direct {
            return ctx.reply(&parser.help()).await;
        }

        if let Some(fallback) = self.commands().sentinel(Sentinel::Default) {
            return fallback
                .run(ctx, CommandInput::Raw(cmdline.to_string()))
                .await;
        }
        Ok(())
    }

    /// Whether a reaction with `emoji` in `guild_id` would file a report.
    pub async fn wants_reaction(&self, guild_id: u64, emoji: &Emoji) -> bool {
        self.servers()
            .get(guild_id)
            .await
            .and_then(|server| server.emoji(REPORT_EMOJI).map(|e| emoji.same_custom_emoji(e)))
            .unwrap_or(false)
    }

    async fn on_reaction_add(self: &Arc<Self>, event: ReactionAddEvent) -> Result<()> {
        let Some(guild_id) = event.guild_id.or(event.message.guild_id) else {
            return Ok(());
        };
        if self.is_self(event.user.id) {
            return Ok(());
        }

        let Some(server) = self.servers().get(guild_id).await else {
            debug!("Reaction in unbound guild {}", guild_id);
            return Ok(());
        };
        let Some(report_emoji) = server.emoji(REPORT_EMOJI) else {
            return Ok(());
        };
        if !event.emoji.same_custom_emoji(report_emoji) {
            return Ok(());
        }

        self.file_report(&server, report_emoji, &event).await
    }

    /// Forward a reported message to the moderators. The four outbound
    /// calls run concurrently and all of them settle before any error is
    /// returned.
    async fn file_report(
        &self,
        server: &ServerProfile,
        report_emoji: &Emoji,
        event: &ReactionAddEvent,
    ) -> Result<()> {
        let message = &event.message;
        let report = format!(
            "Reporting {} saying:\n{}",
            message.author.mention(),
            message.content
        );
        info!(
            "**EMOJI REPORT** from {} in {}: {}",
            event.user.display_name(),
            event.channel.display_name(),
            report
        );

        let embed = (!message.attachments.is_empty()).then(|| OutgoingEmbed {
            author: Some(message.author.display_name()),
            files: message.attachments.clone(),
        });
        let platform = self.platform();

        let remove = platform.remove_reaction(
            message.channel_id,
            message.id,
            event.user.id,
            &event.emoji,
        );
        let forward = async {
            let Some(moderation) = server.moderation() else {
                warn!(
                    "Server {} has no moderation channel, report not forwarded",
                    server.name
                );
                return Ok(());
            };
            let alert = format!(
                "@here **EMOJI REPORT** from {} in {}: {}",
                event.user.mention(),
                event.channel.mention(),
                report
            );
            platform
                .send_message(
                    moderation.id,
                    OutgoingMessage::text(alert).split().with_embed(embed),
                )
                .await
        };
        let acknowledge = platform.react(message.channel_id, message.id, report_emoji);
        let confirmation = format!(
            "Report in {} has been sent to moderators: {}",
            event.channel.mention(),
            report
        );
        let confirm = self.send_dm(event.user.id, &confirmation);

        let (removed, forwarded, acknowledged, confirmed) =
            tokio::join!(remove, forward, acknowledge, confirm);
        removed.context("Failed to remove report reaction")?;
        forwarded.context("Failed to forward report to moderators")?;
        acknowledged.context("Failed to acknowledge report")?;
        confirmed.context("Failed to confirm report to reporter")?;
        Ok(())
    }

    async fn on_member_add(self: &Arc<Self>, event: GuildMemberAddEvent) -> Result<()> {
        let Some(welcome) = self.commands().sentinel(Sentinel::Welcome) else {
            return Ok(());
        };
        let server = self.servers().get(event.guild_id).await;
        let ctx = CommandContext {
            trigger: Trigger::MemberJoin(event.member),
            server,
            bot: self.clone(),
        };
        welcome.run(ctx, CommandInput::Event).await
    }
}
