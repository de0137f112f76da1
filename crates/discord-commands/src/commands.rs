//! Command registry: named commands plus the welcome/fallback sentinels.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use discord_types::{DiscordMember, DiscordMessage};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::warn;

use crate::bot::Bot;
use crate::cmdline::ParsedArgs;
use crate::config::WelcomeConfig;
use crate::errors::CommandError;
use crate::platform::OutgoingMessage;
use crate::servers::ServerProfile;

pub type Action =
    Arc<dyn Fn(CommandContext, CommandInput) -> BoxFuture<'static, Result<()>> + Send + Sync>;
pub type Filter = Arc<dyn Fn(&CommandContext) -> bool + Send + Sync>;

/// Registry keys that users cannot type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// Runs when a member joins a guild.
    Welcome,
    /// Runs when a message matches no command.
    Default,
}

/// What caused a command to run.
#[derive(Debug, Clone)]
pub enum Trigger {
    Message(DiscordMessage),
    MemberJoin(DiscordMember),
}

/// Per-event invocation context.
#[derive(Clone)]
pub struct CommandContext {
    pub trigger: Trigger,
    pub server: Option<Arc<ServerProfile>>,
    pub bot: Arc<Bot>,
}

impl CommandContext {
    pub fn message(&self) -> Option<&DiscordMessage> {
        match &self.trigger {
            Trigger::Message(message) => Some(message),
            Trigger::MemberJoin(_) => None,
        }
    }

    pub fn member(&self) -> Option<&DiscordMember> {
        match &self.trigger {
            Trigger::MemberJoin(member) => Some(member),
            Trigger::Message(_) => None,
        }
    }

    pub fn is_direct(&self) -> bool {
        self.message().is_some_and(DiscordMessage::is_direct)
    }

    pub fn server(&self) -> Option<&ServerProfile> {
        self.server.as_deref()
    }

    /// Reply inline to the triggering message.
    pub async fn reply(&self, content: &str) -> Result<()> {
        match &self.trigger {
            Trigger::Message(message) => self.bot.platform().reply(message, content).await,
            Trigger::MemberJoin(member) => Err(CommandError::NoMessage(member.user.id).into()),
        }
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("trigger", &self.trigger)
            .field("server", &self.server.as_ref().map(|s| &s.name))
            .finish_non_exhaustive()
    }
}

/// Arguments handed to an action.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandInput {
    /// A matched command's parsed arguments.
    Parsed(ParsedArgs),
    /// The trimmed message text, for the fallback command.
    Raw(String),
    /// Non-message triggers carry no arguments.
    Event,
}

impl CommandInput {
    pub fn args(&self) -> Option<&ParsedArgs> {
        match self {
            Self::Parsed(args) => Some(args),
            _ => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Raw(raw) => Some(raw),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct CommandDescriptor {
    /// `word <required> [optional]`; empty means the registry name.
    pub usage: String,
    pub description: String,
    filter: Option<Filter>,
    action: Action,
}

impl CommandDescriptor {
    pub fn new<F, Fut>(usage: impl Into<String>, description: impl Into<String>, action: F) -> Self
    where
        F: Fn(CommandContext, CommandInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            usage: usage.into(),
            description: description.into(),
            filter: None,
            action: Arc::new(move |ctx, input| action(ctx, input).boxed()),
        }
    }

    /// Only offer this command when `filter` accepts the context.
    pub fn with_filter<P>(mut self, filter: P) -> Self
    where
        P: Fn(&CommandContext) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn accepts(&self, ctx: &CommandContext) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(ctx))
    }

    pub fn run(&self, ctx: CommandContext, input: CommandInput) -> BoxFuture<'static, Result<()>> {
        (self.action)(ctx, input)
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("usage", &self.usage)
            .field("description", &self.description)
            .field("filtered", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

/// Named commands in name order, plus sentinels kept apart so they can
/// never be matched from chat text.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    named: BTreeMap<String, CommandDescriptor>,
    sentinels: HashMap<Sentinel, CommandDescriptor>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a named command. Usage patterns are not validated.
    pub fn register(&mut self, name: impl Into<String>, descriptor: CommandDescriptor) {
        self.named.insert(name.into(), descriptor);
    }

    pub fn register_sentinel(&mut self, sentinel: Sentinel, descriptor: CommandDescriptor) {
        self.sentinels.insert(sentinel, descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.named.get(name)
    }

    pub fn sentinel(&self, sentinel: Sentinel) -> Option<&CommandDescriptor> {
        self.sentinels.get(&sentinel)
    }

    /// Named commands whose filter accepts `ctx`, in name order.
    pub fn eligible<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> impl Iterator<Item = (&'a str, &'a CommandDescriptor)> + 'a {
        self.named
            .iter()
            .filter(move |(_, cmd)| cmd.accepts(ctx))
            .map(|(name, cmd)| (name.as_str(), cmd))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty()
    }
}

/// Built-in liveness check.
pub fn status_command() -> CommandDescriptor {
    CommandDescriptor::new(
        "status",
        "Find out about the current status of the bot",
        |ctx: CommandContext, _input| async move {
            let status = ctx.bot.status(ctx.server());
            ctx.reply(&status).await
        },
    )
}

/// Greets a new member in the server's welcome channel.
pub fn welcome_command(welcome: WelcomeConfig) -> CommandDescriptor {
    let welcome = Arc::new(welcome);
    CommandDescriptor::new("", "Greet new members", move |ctx: CommandContext, _input| {
        let welcome = welcome.clone();
        async move {
            let Some(member) = ctx.member() else {
                return Ok(());
            };
            let Some(server) = ctx.server() else {
                warn!("No server bound for guild {}, not greeting", member.guild_id);
                return Ok(());
            };
            let Some(channel) = server.channel(&welcome.channel) else {
                warn!(
                    "Server {} has no '{}' channel, not greeting {}",
                    server.name, welcome.channel, member.user.username
                );
                return Ok(());
            };
            let text = welcome.template.replace("{user}", &member.user.mention());
            ctx.bot
                .platform()
                .send_message(channel.id, OutgoingMessage::text(text))
                .await
        }
    })
}
