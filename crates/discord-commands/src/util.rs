//! Reply and reaction helpers shared by commands.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use discord_types::{DiscordChannel, DiscordMember, DiscordUser};
use tracing::warn;

use crate::bot::Bot;
use crate::commands::CommandContext;
use crate::platform::OutgoingMessage;
use crate::servers::{ServerProfile, WORKING_EMOJI};

/// How long an action may run before the working emoji appears.
pub const SPIN_DELAY: Duration = Duration::from_millis(50);

/// Human-readable name for log lines and replies.
pub trait DisplayName {
    fn display_name(&self) -> String;
}

impl DisplayName for str {
    fn display_name(&self) -> String {
        self.to_string()
    }
}

impl DisplayName for String {
    fn display_name(&self) -> String {
        self.clone()
    }
}

impl DisplayName for DiscordUser {
    fn display_name(&self) -> String {
        let mut name = self
            .global_name
            .clone()
            .unwrap_or_else(|| self.username.clone());
        if let Some(discriminator) = self.discriminator {
            name.push_str(&format!("#{:04}", discriminator));
        }
        name
    }
}

impl DisplayName for DiscordMember {
    fn display_name(&self) -> String {
        match &self.nick {
            Some(nick) => nick.clone(),
            None => self.user.display_name(),
        }
    }
}

impl DisplayName for DiscordChannel {
    fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.mention(),
        }
    }
}

impl DisplayName for ServerProfile {
    fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// Display name of an optional value; absent stays absent.
pub fn name<T: DisplayName + ?Sized>(thing: Option<&T>) -> Option<String> {
    thing.map(DisplayName::display_name)
}

/// Shorten `s` to at most `len` chars, ending in `…` when cut.
pub fn truncate(s: &str, len: usize) -> String {
    if s.chars().count() <= len {
        return s.to_string();
    }
    if len == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(len.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Break `content` into chunks of at most `limit` chars, preferring line
/// boundaries. Lines longer than `limit` are hard-split.
pub fn split_message(content: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in content.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            push_chunk(&mut chunks, std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        let chars: Vec<char> = body.chars().collect();
        let mut pieces = chars.chunks(limit).peekable();
        while let Some(piece) = pieces.next() {
            let piece: String = piece.iter().collect();
            if pieces.peek().is_some() {
                push_chunk(&mut chunks, piece);
            } else {
                current_len = piece.chars().count() + newline.len();
                current = piece + newline;
            }
        }
    }

    push_chunk(&mut chunks, current);
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: String) {
    let chunk = chunk.trim_end_matches('\n');
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}

impl Bot {
    /// Open (or reuse) the private channel with `user_id` and send to it.
    pub async fn send_dm(&self, user_id: u64, content: &str) -> Result<()> {
        let channel_id = self.platform().create_dm_channel(user_id).await?;
        self.platform()
            .send_message(channel_id, OutgoingMessage::text(content).split())
            .await
    }

    /// Run `action`, showing the server's working emoji on the triggering
    /// message if it takes longer than [`SPIN_DELAY`]. The action's result
    /// is returned as is; emoji failures are only logged.
    pub async fn with_spin<F, T>(&self, ctx: &CommandContext, action: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let working = ctx.server().and_then(|server| server.emoji(WORKING_EMOJI));
        let (Some(message), Some(emoji)) = (ctx.message(), working) else {
            return action.await;
        };

        tokio::pin!(action);
        tokio::select! {
            biased;
            result = &mut action => return result,
            _ = tokio::time::sleep(SPIN_DELAY) => {}
        }

        let platform = self.platform();
        let (result, reacted) = tokio::join!(
            &mut action,
            platform.react(message.channel_id, message.id, emoji)
        );
        match reacted {
            Ok(()) => {
                if let Err(e) = platform
                    .remove_own_reaction(message.channel_id, message.id, emoji)
                    .await
                {
                    warn!("Failed to remove working emoji: {}", e);
                }
            }
            Err(e) => warn!("Failed to add working emoji: {}", e),
        }
        result
    }
}
