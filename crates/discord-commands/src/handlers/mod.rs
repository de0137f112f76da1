//! Serenity event handler implementation

use std::sync::Arc;

use discord_types::{
    ClientErrorCode, ClientErrorEvent, DiscordUser, GuildMemberAddEvent, MessageCreatedEvent,
    ReactionAddEvent, ReadyEvent,
};
use serenity::async_trait;
use serenity::gateway::{ConnectionStage, ShardStageUpdateEvent};
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::Ready;
use serenity::model::guild::Member;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use tracing::{debug, error};

use crate::bot::Bot;
use crate::bridge::{
    convert_channel, convert_guild, convert_member, convert_message, convert_reaction_type,
    convert_user,
};
use crate::errors;
use crate::health::AppState;

pub struct Handler;

async fn shared_bot(ctx: &Context) -> Option<Arc<Bot>> {
    let data = ctx.data.read().await;
    match data.get::<Bot>() {
        Some(b) => Some(b.clone()),
        None => {
            error!("Bot not found in context data");
            None
        }
    }
}

/// Snapshot the cached guilds among `guild_ids`; guilds not cached yet
/// are left out.
fn ready_event(ctx: &Context, user: DiscordUser, guild_ids: &[GuildId]) -> ReadyEvent {
    let guilds = guild_ids
        .iter()
        .filter_map(|id| ctx.cache.guild(*id).map(|guild| convert_guild(&guild)))
        .collect();
    ReadyEvent { user, guilds }
}

async fn bind_servers(ctx: &Context, event: ReadyEvent) {
    let Some(bot) = shared_bot(ctx).await else {
        return;
    };
    let username = event.user.tag();
    bot.client_ready(event).await;

    let data = ctx.data.read().await;
    if let Some(health) = data.get::<AppState>() {
        health.set_bot_username(username).await;
        health.set_bound_servers(bot.servers().len().await);
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Reconnects with a fresh session land here with guilds already
    /// cached. On first connect the guilds arrive later; `cache_ready`
    /// binds them.
    async fn ready(&self, ctx: Context, ready: Ready) {
        let guild_ids: Vec<GuildId> = ready.guilds.iter().map(|g| g.id).collect();
        let event = ready_event(&ctx, convert_user(&ready.user), &guild_ids);
        if event.guilds.len() < guild_ids.len() {
            debug!(
                "Waiting for guild cache ({} of {} guilds cached)",
                event.guilds.len(),
                guild_ids.len()
            );
            return;
        }
        bind_servers(&ctx, event).await;
    }

    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        let user = convert_user(&ctx.cache.current_user());
        let event = ready_event(&ctx, user, &guilds);
        bind_servers(&ctx, event).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let Some(bot) = shared_bot(&ctx).await else {
            return;
        };
        bot.client_message(MessageCreatedEvent {
            message: convert_message(&msg),
        })
        .await;
    }

    async fn reaction_add(&self, ctx: Context, add_reaction: Reaction) {
        // DM reactions never file reports
        let Some(guild_id) = add_reaction.guild_id else {
            return;
        };
        let Some(bot) = shared_bot(&ctx).await else {
            return;
        };
        if let Some(user_id) = add_reaction.user_id {
            if bot.user_id() == Some(user_id.get()) {
                return;
            }
        }

        // Skip the HTTP round-trips below for reactions nobody acts on.
        let emoji = convert_reaction_type(&add_reaction.emoji);
        if !bot.wants_reaction(guild_id.get(), &emoji).await {
            return;
        }

        let user = match add_reaction.user(&ctx).await {
            Ok(user) => user,
            Err(e) => {
                errors::log_error("reaction_add", "Failed to fetch reacting user", &e);
                return;
            }
        };
        let message = match add_reaction.message(&ctx).await {
            Ok(message) => message,
            Err(e) => {
                errors::log_error("reaction_add", "Failed to fetch reacted message", &e);
                return;
            }
        };
        let channel = match add_reaction.channel_id.to_channel(&ctx).await {
            Ok(channel) => channel,
            Err(e) => {
                errors::log_error("reaction_add", "Failed to fetch reaction channel", &e);
                return;
            }
        };

        let mut message = convert_message(&message);
        if message.guild_id.is_none() {
            message.guild_id = Some(guild_id.get());
        }

        bot.client_reaction_add(ReactionAddEvent {
            user: convert_user(&user),
            channel: convert_channel(&channel),
            message,
            emoji,
            guild_id: Some(guild_id.get()),
        })
        .await;
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let Some(bot) = shared_bot(&ctx).await else {
            return;
        };
        bot.client_member_add(GuildMemberAddEvent {
            guild_id: new_member.guild_id.get(),
            member: convert_member(&new_member),
        })
        .await;
    }

    async fn shard_stage_update(&self, ctx: Context, event: ShardStageUpdateEvent) {
        if !matches!(
            event.new,
            ConnectionStage::Resuming | ConnectionStage::Disconnected
        ) {
            return;
        }
        let Some(bot) = shared_bot(&ctx).await else {
            return;
        };
        bot.client_error(ClientErrorEvent::new(
            ClientErrorCode::ConnectionReset,
            format!(
                "Shard {:?} went from {:?} to {:?}",
                event.shard_id, event.old, event.new
            ),
        ))
        .await;
    }
}
