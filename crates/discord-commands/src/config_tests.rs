#[cfg(test)]
mod tests {
    use crate::config::{Config, ReadEnv, WelcomeConfig};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct InMemoryEnv(HashMap<&'static str, &'static str>);

    impl InMemoryEnv {
        fn new(pairs: &[(&'static str, &'static str)]) -> Self {
            Self(pairs.iter().cloned().collect())
        }
    }

    impl ReadEnv for InMemoryEnv {
        fn var(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── from_file ─────────────────────────────────────────────────────────────

    #[test]
    fn test_from_file_minimal() {
        let toml = r#"
[discord]
token = "BOT-TOKEN-123"
"#;
        let f = write_toml(toml);
        let cfg = Config::from_file(f.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.discord.token, "BOT-TOKEN-123");
        assert_eq!(cfg.discord.name, None);
        assert!(cfg.discord.emoji.is_empty());
        assert!(cfg.discord.welcome.is_none());
        assert!(cfg.servers.is_empty());
    }

    #[test]
    fn test_from_file_with_servers() {
        let toml = r#"
[discord]
token = "SECRET"
name = "Bot"

[discord.emoji]
report = "redflag"

[servers.Guild1.channels]
mod = "moderation"
moderation = "mod-queue"

[servers.Guild2]
channels = { welcome = "lobby" }
emoji = { working = "hourglass" }
"#;
        let f = write_toml(toml);
        let cfg = Config::from_file(f.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.discord.name.as_deref(), Some("Bot"));
        assert_eq!(cfg.discord.emoji["report"], "redflag");

        let guild1 = &cfg.servers["Guild1"];
        assert_eq!(guild1.channels["mod"], "moderation");
        assert_eq!(guild1.channels["moderation"], "mod-queue");
        assert_eq!(guild1.emoji, None);

        let guild2 = &cfg.servers["Guild2"];
        assert_eq!(guild2.channels["welcome"], "lobby");
        assert_eq!(
            guild2.emoji.as_ref().map(|e| e["working"].as_str()),
            Some("hourglass")
        );
    }

    #[test]
    fn test_from_file_welcome_defaults() {
        let toml = r#"
[discord]
token = "SECRET"

[discord.welcome]
"#;
        let f = write_toml(toml);
        let cfg = Config::from_file(f.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.discord.welcome, Some(WelcomeConfig::default()));
        let welcome = cfg.discord.welcome.unwrap();
        assert_eq!(welcome.channel, "welcome");
        assert!(welcome.template.contains("{user}"));
    }

    #[test]
    fn test_from_file_missing_file_errors() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        assert!(result.is_err());
        let msg = format!("{:#}", result.unwrap_err());
        assert!(msg.contains("Failed to read config file"));
    }

    #[test]
    fn test_from_file_invalid_toml_errors() {
        let f = write_toml("this is not valid toml ][[[");
        let result = Config::from_file(f.path().to_str().unwrap());
        assert!(result.is_err());
        let msg = format!("{:#}", result.unwrap_err());
        assert!(msg.contains("Failed to parse config file"));
    }

    // ── from_env ──────────────────────────────────────────────────────────────

    #[test]
    fn test_from_env_token_and_name() {
        let env = InMemoryEnv::new(&[("DISCORD_BOT_TOKEN", "tok"), ("DISCORD_BOT_NAME", "Bot")]);
        let cfg = Config::from_env(&env).unwrap();
        assert_eq!(cfg.discord.token, "tok");
        assert_eq!(cfg.discord.name.as_deref(), Some("Bot"));
        assert!(cfg.servers.is_empty());
    }

    #[test]
    fn test_from_env_blank_name_is_none() {
        let env = InMemoryEnv::new(&[("DISCORD_BOT_TOKEN", "tok"), ("DISCORD_BOT_NAME", "  ")]);
        let cfg = Config::from_env(&env).unwrap();
        assert_eq!(cfg.discord.name, None);
    }

    #[test]
    fn test_from_env_missing_token_errors() {
        let env = InMemoryEnv::new(&[]);
        let err = Config::from_env(&env).unwrap_err();
        assert!(err.to_string().contains("DISCORD_BOT_TOKEN"));
    }

    // ── validate ──────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_empty_token() {
        let cfg = Config::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_channel_name() {
        let toml = r#"
[discord]
token = "SECRET"

[servers.Guild1.channels]
moderation = ""
"#;
        let f = write_toml(toml);
        let cfg = Config::from_file(f.path().to_str().unwrap()).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Guild1"));
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let env = InMemoryEnv::new(&[("DISCORD_BOT_TOKEN", "tok")]);
        assert!(Config::from_env(&env).unwrap().validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../config/discord-commands.example.toml"
        );
        let cfg = Config::from_file(path).unwrap();
        assert_eq!(cfg.discord.name.as_deref(), Some("Bot"));
        assert_eq!(cfg.discord.emoji["report"], "redflag");
        assert_eq!(cfg.servers["Guild1"].channels["moderation"], "mod-queue");
        assert!(cfg.servers["Guild1"].emoji.is_none());
        assert!(cfg.servers["Guild2"].emoji.is_some());
        assert_eq!(cfg.discord.welcome.unwrap().channel, "welcome");
    }
}
