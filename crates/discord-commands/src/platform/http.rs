//! Live platform backed by serenity's HTTP client.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use discord_types::{DiscordMember, DiscordMessage, Emoji};
use serenity::builder::{CreateAttachment, CreateEmbed, CreateEmbedAuthor, CreateMessage};
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use tracing::{debug, warn};

use super::{OutgoingEmbed, OutgoingMessage, Platform, MESSAGE_LIMIT};
use crate::bridge::{convert_member, to_reaction_type};
use crate::util::split_message;

pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    /// Build the embed and re-upload its files. Files that cannot be fetched
    /// are skipped so the text of the message still goes out.
    async fn build_embed(&self, embed: &OutgoingEmbed) -> (CreateEmbed, Vec<CreateAttachment>) {
        let mut builder = CreateEmbed::new();
        if let Some(author) = &embed.author {
            builder = builder.author(CreateEmbedAuthor::new(author));
        }

        let mut files = Vec::with_capacity(embed.files.len());
        for attachment in &embed.files {
            match CreateAttachment::url(self.http.clone(), &attachment.url).await {
                Ok(file) => files.push(file),
                Err(e) => warn!(
                    "Failed to fetch attachment {} ({}): {}",
                    attachment.filename, attachment.url, e
                ),
            }
        }
        (builder, files)
    }
}

#[async_trait]
impl Platform for SerenityPlatform {
    async fn reply(&self, message: &DiscordMessage, content: &str) -> Result<()> {
        let channel = ChannelId::new(message.channel_id);
        let builder = CreateMessage::new()
            .content(content)
            .reference_message((channel, MessageId::new(message.id)));
        channel.send_message(&*self.http, builder).await?;
        Ok(())
    }

    async fn send_message(&self, channel_id: u64, message: OutgoingMessage) -> Result<()> {
        let channel = ChannelId::new(channel_id);
        let chunks = if message.split {
            split_message(&message.content, MESSAGE_LIMIT)
        } else {
            vec![message.content.clone()]
        };

        // The embed and its files ride on the last chunk.
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut builder = CreateMessage::new().content(chunk);
            if i == last {
                if let Some(embed) = &message.embed {
                    let (embed, files) = self.build_embed(embed).await;
                    builder = builder.embed(embed).add_files(files);
                }
            }
            channel.send_message(&*self.http, builder).await?;
        }
        debug!("Sent message to channel {}", channel_id);
        Ok(())
    }

    async fn react(&self, channel_id: u64, message_id: u64, emoji: &Emoji) -> Result<()> {
        self.http
            .create_reaction(
                ChannelId::new(channel_id),
                MessageId::new(message_id),
                &to_reaction_type(emoji),
            )
            .await?;
        Ok(())
    }

    async fn remove_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        user_id: u64,
        emoji: &Emoji,
    ) -> Result<()> {
        self.http
            .delete_reaction(
                ChannelId::new(channel_id),
                MessageId::new(message_id),
                UserId::new(user_id),
                &to_reaction_type(emoji),
            )
            .await?;
        Ok(())
    }

    async fn remove_own_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &Emoji,
    ) -> Result<()> {
        self.http
            .delete_reaction_me(
                ChannelId::new(channel_id),
                MessageId::new(message_id),
                &to_reaction_type(emoji),
            )
            .await?;
        Ok(())
    }

    async fn create_dm_channel(&self, user_id: u64) -> Result<u64> {
        let channel = UserId::new(user_id)
            .create_dm_channel(&*self.http)
            .await?;
        Ok(channel.id.get())
    }

    async fn fetch_member(&self, guild_id: u64, user_id: u64) -> Result<DiscordMember> {
        let member = GuildId::new(guild_id)
            .member(&*self.http, UserId::new(user_id))
            .await?;
        Ok(convert_member(&member))
    }
}
