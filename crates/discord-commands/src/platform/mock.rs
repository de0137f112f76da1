//! In-memory platform for unit testing without a Discord connection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use discord_types::{DiscordMember, DiscordMessage, DiscordUser, Emoji};

use super::{OutgoingMessage, Platform};
use crate::errors::CommandError;

/// Offset added to a user id to derive the id of its mock DM channel.
pub const DM_CHANNEL_OFFSET: u64 = 1_000_000_000;

/// One recorded outbound call, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Reply {
        channel_id: u64,
        message_id: u64,
        content: String,
    },
    SendMessage {
        channel_id: u64,
        message: OutgoingMessage,
    },
    React {
        channel_id: u64,
        message_id: u64,
        emoji: Emoji,
    },
    RemoveReaction {
        channel_id: u64,
        message_id: u64,
        user_id: u64,
        emoji: Emoji,
    },
    RemoveOwnReaction {
        channel_id: u64,
        message_id: u64,
        emoji: Emoji,
    },
    CreateDmChannel {
        user_id: u64,
    },
    FetchMember {
        guild_id: u64,
        user_id: u64,
    },
}

/// Records every call; use in tests instead of [`super::SerenityPlatform`].
///
/// Every call waits for the configured latency before returning, so tests
/// can observe how many calls were outstanding at once.
#[derive(Default)]
pub struct MockPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    members: Mutex<HashSet<(u64, u64)>>,
    failing_channels: Mutex<HashSet<u64>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make `user_id` a member of `guild_id` for [`Platform::fetch_member`].
    pub fn with_member(self, guild_id: u64, user_id: u64) -> Self {
        self.members.lock().unwrap().insert((guild_id, user_id));
        self
    }

    /// Make every send/reply to `channel_id` fail.
    pub fn with_failing_channel(self, channel_id: u64) -> Self {
        self.failing_channels.lock().unwrap().insert(channel_id);
        self
    }

    pub fn dm_channel_id(user_id: u64) -> u64 {
        user_id + DM_CHANNEL_OFFSET
    }

    /// Snapshot of all recorded calls in issue order.
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }

    /// Contents of every inline reply.
    pub fn replies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PlatformCall::Reply { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    /// Contents of every message posted to `channel_id`.
    pub fn sent_to(&self, channel_id: u64) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PlatformCall::SendMessage {
                    channel_id: id,
                    message,
                } if id == channel_id => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Contents of every direct message sent to `user_id`.
    pub fn dms_to(&self, user_id: u64) -> Vec<String> {
        self.sent_to(Self::dm_channel_id(user_id))
            .into_iter()
            .map(|m| m.content)
            .collect()
    }

    /// Highest number of calls that were outstanding at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn record(&self, call: PlatformCall) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);
        self.calls.lock().unwrap().push(call);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn check_channel(&self, channel_id: u64) -> Result<()> {
        if self.failing_channels.lock().unwrap().contains(&channel_id) {
            return Err(CommandError::ChannelUnavailable(channel_id).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn reply(&self, message: &DiscordMessage, content: &str) -> Result<()> {
        self.record(PlatformCall::Reply {
            channel_id: message.channel_id,
            message_id: message.id,
            content: content.to_string(),
        })
        .await;
        self.check_channel(message.channel_id)
    }

    async fn send_message(&self, channel_id: u64, message: OutgoingMessage) -> Result<()> {
        self.record(PlatformCall::SendMessage {
            channel_id,
            message,
        })
        .await;
        self.check_channel(channel_id)
    }

    async fn react(&self, channel_id: u64, message_id: u64, emoji: &Emoji) -> Result<()> {
        self.record(PlatformCall::React {
            channel_id,
            message_id,
            emoji: emoji.clone(),
        })
        .await;
        Ok(())
    }

    async fn remove_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        user_id: u64,
        emoji: &Emoji,
    ) -> Result<()> {
        self.record(PlatformCall::RemoveReaction {
            channel_id,
            message_id,
            user_id,
            emoji: emoji.clone(),
        })
        .await;
        Ok(())
    }

    async fn remove_own_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &Emoji,
    ) -> Result<()> {
        self.record(PlatformCall::RemoveOwnReaction {
            channel_id,
            message_id,
            emoji: emoji.clone(),
        })
        .await;
        Ok(())
    }

    async fn create_dm_channel(&self, user_id: u64) -> Result<u64> {
        self.record(PlatformCall::CreateDmChannel { user_id }).await;
        Ok(Self::dm_channel_id(user_id))
    }

    async fn fetch_member(&self, guild_id: u64, user_id: u64) -> Result<DiscordMember> {
        self.record(PlatformCall::FetchMember { guild_id, user_id })
            .await;
        if !self.members.lock().unwrap().contains(&(guild_id, user_id)) {
            return Err(CommandError::NotAMember { guild_id, user_id }.into());
        }
        Ok(DiscordMember {
            user: DiscordUser {
                id: user_id,
                username: format!("user{}", user_id),
                global_name: None,
                discriminator: None,
                bot: false,
            },
            guild_id,
            nick: None,
            roles: vec![],
        })
    }
}
