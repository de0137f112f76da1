//! Bridge from serenity models to discord-types records
//!
//! The router never sees serenity types; everything it consumes is converted
//! here first.

#[path = "bridge_tests.rs"]
mod bridge_tests;

use discord_types::{
    Attachment, ChannelType, DiscordChannel, DiscordGuild, DiscordMember, DiscordMessage,
    DiscordUser, Emoji,
};
use serenity::model::channel::{
    Channel, ChannelType as SerenityChannelType, GuildChannel, Message as SerenityMessage,
    ReactionType,
};
use serenity::model::guild::{Emoji as SerenityEmoji, Guild, Member};
use serenity::model::id::EmojiId;
use serenity::model::user::User as SerenityUser;

pub fn convert_user(user: &SerenityUser) -> DiscordUser {
    DiscordUser {
        id: user.id.get(),
        username: user.name.clone(),
        global_name: user.global_name.as_deref().map(String::from),
        discriminator: user.discriminator.map(|d| d.get()),
        bot: user.bot,
    }
}

pub fn convert_message(msg: &SerenityMessage) -> DiscordMessage {
    let attachments = msg
        .attachments
        .iter()
        .map(|a| Attachment {
            id: a.id.get(),
            filename: a.filename.clone(),
            url: a.url.clone(),
            content_type: a.content_type.clone(),
            size: a.size as u64,
        })
        .collect();

    DiscordMessage {
        id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        guild_id: msg.guild_id.map(|g| g.get()),
        author: convert_user(&msg.author),
        content: msg.content.clone(),
        attachments,
    }
}

pub fn convert_member(member: &Member) -> DiscordMember {
    DiscordMember {
        user: convert_user(&member.user),
        guild_id: member.guild_id.get(),
        nick: member.nick.clone(),
        roles: member.roles.iter().map(|r| r.get()).collect(),
    }
}

pub fn convert_channel_kind(kind: SerenityChannelType) -> ChannelType {
    match kind {
        SerenityChannelType::Text => ChannelType::GuildText,
        SerenityChannelType::Private => ChannelType::Dm,
        SerenityChannelType::Voice => ChannelType::GuildVoice,
        SerenityChannelType::Category => ChannelType::GuildCategory,
        SerenityChannelType::News => ChannelType::GuildNews,
        SerenityChannelType::Stage => ChannelType::GuildStageVoice,
        SerenityChannelType::Forum => ChannelType::GuildForum,
        _ => ChannelType::Unknown,
    }
}

pub fn convert_guild_channel(channel: &GuildChannel) -> DiscordChannel {
    DiscordChannel {
        id: channel.id.get(),
        channel_type: convert_channel_kind(channel.kind),
        guild_id: Some(channel.guild_id.get()),
        name: Some(channel.name.clone()),
    }
}

pub fn convert_channel(channel: &Channel) -> DiscordChannel {
    match channel {
        Channel::Guild(gc) => convert_guild_channel(gc),
        Channel::Private(pc) => DiscordChannel {
            id: pc.id.get(),
            channel_type: ChannelType::Dm,
            guild_id: None,
            name: None,
        },
        _ => DiscordChannel {
            id: channel.id().get(),
            channel_type: ChannelType::Unknown,
            guild_id: None,
            name: None,
        },
    }
}

pub fn convert_emoji(emoji: &SerenityEmoji) -> Emoji {
    Emoji {
        id: Some(emoji.id.get()),
        name: emoji.name.clone(),
        animated: emoji.animated,
    }
}

/// Snapshot a cached guild with its channels and emoji in a stable order
/// (channel position, then id), so name matching is deterministic.
pub fn convert_guild(guild: &Guild) -> DiscordGuild {
    let mut channels: Vec<&GuildChannel> = guild.channels.values().collect();
    channels.sort_by_key(|c| (c.position, c.id));

    let mut emojis: Vec<&SerenityEmoji> = guild.emojis.values().collect();
    emojis.sort_by_key(|e| e.id);

    DiscordGuild {
        id: guild.id.get(),
        name: guild.name.clone(),
        channels: channels.into_iter().map(convert_guild_channel).collect(),
        emojis: emojis.into_iter().map(convert_emoji).collect(),
    }
}

pub fn convert_reaction_type(reaction: &ReactionType) -> Emoji {
    match reaction {
        ReactionType::Unicode(s) => Emoji {
            id: None,
            name: s.clone(),
            animated: false,
        },
        ReactionType::Custom { animated, id, name } => Emoji {
            id: Some(id.get()),
            name: name.clone().unwrap_or_default(),
            animated: *animated,
        },
        _ => Emoji {
            id: None,
            name: String::new(),
            animated: false,
        },
    }
}

pub fn to_reaction_type(emoji: &Emoji) -> ReactionType {
    match emoji.id {
        Some(id) => ReactionType::Custom {
            animated: emoji.animated,
            id: EmojiId::new(id),
            name: Some(emoji.name.clone()),
        },
        None => ReactionType::Unicode(emoji.name.clone()),
    }
}
