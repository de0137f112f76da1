//! Sub-command matching over tokenized chat text.

use std::collections::BTreeMap;
use std::fmt;

use super::tokenize::tokenize;
use super::usage::Usage;

/// Largest edit distance for which an unknown word gets a suggestion.
const RECOMMEND_THRESHOLD: usize = 3;

/// Value of a named argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

/// Result of matching one message against the registered sub-commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    /// Registry name of the matched sub-command.
    pub command: Option<String>,
    /// Every non-flag token in order; the lead token comes first.
    pub positionals: Vec<String>,
    /// `--flags` plus positionals bound to names by the usage pattern.
    pub named: BTreeMap<String, ArgValue>,
}

impl ParsedArgs {
    pub fn lead(&self) -> Option<&str> {
        self.positionals.first().map(String::as_str)
    }

    /// Positionals after the lead token.
    pub fn rest(&self) -> &[String] {
        self.positionals.get(1..).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.named.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.named.get(key).and_then(ArgValue::as_str)
    }

    /// True only for a flag explicitly set to true.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.named.get(key), Some(ArgValue::Bool(true)))
    }
}

/// What the parser has to say about a message.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// Text to show the user instead of running anything (usage errors,
    /// suggestions).
    pub output: Option<String>,
    pub args: ParsedArgs,
}

#[derive(Debug, Clone)]
struct SubCommand {
    name: String,
    usage: Usage,
    description: String,
}

/// Throwaway parser built for a single message.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    commands: Vec<SubCommand>,
    demand_command: bool,
    recommend_commands: bool,
}

impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `name` as a sub-command. An empty usage falls back to the name.
    pub fn command(mut self, name: &str, usage: &str, description: &str) -> Self {
        let usage = if usage.trim().is_empty() {
            Usage::parse(name)
        } else {
            Usage::parse(usage)
        };
        self.commands.push(SubCommand {
            name: name.to_string(),
            usage,
            description: description.to_string(),
        });
        self
    }

    /// Require at least one positional token.
    pub fn demand_command(mut self) -> Self {
        self.demand_command = true;
        self
    }

    /// Suggest the closest sub-command for an unknown lead word.
    pub fn recommend_commands(mut self) -> Self {
        self.recommend_commands = true;
        self
    }

    pub fn parse(&self, input: &str) -> ParseOutcome {
        let (positionals, named) = split_flags(tokenize(input));
        let mut args = ParsedArgs {
            command: None,
            positionals,
            named,
        };

        let Some(lead) = args.lead().map(str::to_string) else {
            if self.demand_command {
                return fail(
                    format!("{}\n\n{}", self.help(), not_enough_arguments(0, 1)),
                    args,
                );
            }
            return ok(args);
        };

        let Some(sub) = self.commands.iter().find(|c| c.usage.word == lead) else {
            if self.recommend_commands {
                if let Some(suggestion) = self.recommend(&lead) {
                    return fail(
                        format!("{}\n\nDid you mean {}?", self.help(), suggestion),
                        args,
                    );
                }
            }
            return ok(args);
        };

        let rest = args.rest().to_vec();
        let required = sub.usage.required_count();
        if rest.len() < required {
            let mut text = sub.usage.to_string();
            if !sub.description.is_empty() {
                text.push_str("\n\n");
                text.push_str(&sub.description);
            }
            text.push_str("\n\n");
            text.push_str(&not_enough_arguments(rest.len(), required));
            return fail(text, args);
        }

        for (i, positional) in sub.usage.positionals.iter().enumerate() {
            if positional.variadic {
                let values = rest.get(i..).unwrap_or_default().to_vec();
                if !values.is_empty() {
                    args.named
                        .insert(positional.name.clone(), ArgValue::List(values));
                }
                break;
            }
            if let Some(value) = rest.get(i) {
                args.named
                    .insert(positional.name.clone(), ArgValue::Str(value.clone()));
            }
        }

        args.command = Some(sub.name.clone());
        ok(args)
    }

    /// `Commands:` followed by one aligned `usage  description` line each.
    pub fn help(&self) -> String {
        if self.commands.is_empty() {
            return "No commands are available here.".to_string();
        }
        let width = self
            .commands
            .iter()
            .map(|c| c.usage.as_str().chars().count())
            .max()
            .unwrap_or(0);

        let mut help = String::from("Commands:");
        for cmd in &self.commands {
            let line = format!("  {:<width$}  {}", cmd.usage.as_str(), cmd.description);
            help.push('\n');
            help.push_str(line.trim_end());
        }
        help
    }

    fn recommend(&self, word: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for cmd in &self.commands {
            let distance = levenshtein(word, &cmd.usage.word);
            if distance <= RECOMMEND_THRESHOLD && best.map_or(true, |(_, d)| distance < d) {
                best = Some((&cmd.usage.word, distance));
            }
        }
        best.map(|(w, _)| w)
    }
}

fn ok(args: ParsedArgs) -> ParseOutcome {
    ParseOutcome { output: None, args }
}

fn fail(output: String, args: ParsedArgs) -> ParseOutcome {
    ParseOutcome {
        output: Some(output),
        args,
    }
}

fn not_enough_arguments(got: usize, need: usize) -> String {
    format!(
        "Not enough non-option arguments: got {}, need at least {}",
        got, need
    )
}

fn is_negative_number(token: &str) -> bool {
    token
        .strip_prefix('-')
        .is_some_and(|n| !n.is_empty() && n.parse::<f64>().is_ok())
}

fn is_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && !is_negative_number(token)
}

fn insert_named(named: &mut BTreeMap<String, ArgValue>, key: &str, value: ArgValue) {
    match named.remove(key) {
        None => {
            named.insert(key.to_string(), value);
        }
        Some(ArgValue::List(mut items)) => {
            items.push(value.to_string());
            named.insert(key.to_string(), ArgValue::List(items));
        }
        Some(previous) => {
            named.insert(
                key.to_string(),
                ArgValue::List(vec![previous.to_string(), value.to_string()]),
            );
        }
    }
}

/// Separate flags from positionals.
///
/// `--k=v`, `--k v`, `--k` (true), `--no-k` (false), `-abc` (each true),
/// `-k v`; `--` ends flag parsing. Negative numbers are positionals.
fn split_flags(tokens: Vec<String>) -> (Vec<String>, BTreeMap<String, ArgValue>) {
    let mut positionals = Vec::new();
    let mut named = BTreeMap::new();
    let mut iter = tokens.into_iter().peekable();

    let takes_value = |next: Option<&String>| next.is_some_and(|t| !is_flag(t));

    while let Some(token) = iter.next() {
        if token == "--" {
            positionals.extend(iter);
            break;
        }

        if let Some(body) = token.strip_prefix("--") {
            if let Some((key, value)) = body.split_once('=') {
                insert_named(&mut named, key, ArgValue::Str(value.to_string()));
            } else if let Some(key) = body.strip_prefix("no-") {
                insert_named(&mut named, key, ArgValue::Bool(false));
            } else if takes_value(iter.peek()) {
                let value = iter.next().unwrap_or_default();
                insert_named(&mut named, body, ArgValue::Str(value));
            } else {
                insert_named(&mut named, body, ArgValue::Bool(true));
            }
            continue;
        }

        if is_flag(&token) {
            let body = &token[1..];
            if let Some((key, value)) = body.split_once('=') {
                insert_named(&mut named, key, ArgValue::Str(value.to_string()));
                continue;
            }
            let letters: Vec<char> = body.chars().collect();
            let Some((last, init)) = letters.split_last() else {
                positionals.push(token);
                continue;
            };
            for letter in init {
                insert_named(&mut named, &letter.to_string(), ArgValue::Bool(true));
            }
            if takes_value(iter.peek()) {
                let value = iter.next().unwrap_or_default();
                insert_named(&mut named, &last.to_string(), ArgValue::Str(value));
            } else {
                insert_named(&mut named, &last.to_string(), ArgValue::Bool(true));
            }
            continue;
        }

        positionals.push(token);
    }

    (positionals, named)
}

/// Edit distance between two words, counted in chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CommandLine {
        CommandLine::new()
            .command("status", "status", "Find out about the current status of the bot")
            .command("kick", "kick <user> [reason]", "Kick a member")
            .command("say", "say <words..>", "Repeat after me")
    }

    #[test]
    fn test_matches_bare_command() {
        let outcome = parser().parse("status");
        assert!(outcome.output.is_none());
        assert_eq!(outcome.args.command.as_deref(), Some("status"));
        assert_eq!(outcome.args.lead(), Some("status"));
    }

    #[test]
    fn test_binds_named_positionals() {
        let outcome = parser().parse("kick bob spamming");
        assert_eq!(outcome.args.command.as_deref(), Some("kick"));
        assert_eq!(outcome.args.get_str("user"), Some("bob"));
        assert_eq!(outcome.args.get_str("reason"), Some("spamming"));
        assert_eq!(outcome.args.rest(), ["bob", "spamming"]);
    }

    #[test]
    fn test_optional_positional_may_be_absent() {
        let outcome = parser().parse("kick bob");
        assert!(outcome.output.is_none());
        assert_eq!(outcome.args.get("reason"), None);
    }

    #[test]
    fn test_variadic_collects_rest() {
        let outcome = parser().parse(r#"say hello "big world" again"#);
        assert_eq!(
            outcome.args.get("words").and_then(ArgValue::as_list),
            Some(&["hello".to_string(), "big world".to_string(), "again".to_string()][..])
        );
    }

    #[test]
    fn test_missing_required_positional_reports_usage() {
        let outcome = parser().parse("kick");
        let output = outcome.output.expect("usage error");
        assert!(output.starts_with("kick <user> [reason]"));
        assert!(output.contains("Kick a member"));
        assert!(output.ends_with("Not enough non-option arguments: got 0, need at least 1"));
        assert_eq!(outcome.args.command, None);
    }

    #[test]
    fn test_unknown_word_has_no_command_and_no_output() {
        let outcome = parser().parse("hello there");
        assert!(outcome.output.is_none());
        assert_eq!(outcome.args.command, None);
        assert_eq!(outcome.args.lead(), Some("hello"));
    }

    #[test]
    fn test_empty_input_without_demand() {
        let outcome = parser().parse("");
        assert!(outcome.output.is_none());
        assert_eq!(outcome.args.lead(), None);
    }

    #[test]
    fn test_empty_input_with_demand() {
        let outcome = parser().demand_command().parse("   ");
        let output = outcome.output.expect("demand error");
        assert!(output.starts_with("Commands:"));
        assert!(output.ends_with("Not enough non-option arguments: got 0, need at least 1"));
    }

    #[test]
    fn test_recommendation_for_typo() {
        let outcome = parser().recommend_commands().parse("statsu");
        let output = outcome.output.expect("suggestion");
        assert!(output.ends_with("Did you mean status?"));
    }

    #[test]
    fn test_no_recommendation_for_distant_word() {
        let outcome = parser().recommend_commands().parse("xylophone");
        assert!(outcome.output.is_none());
    }

    #[test]
    fn test_recommendation_disabled_by_default() {
        assert!(parser().parse("statsu").output.is_none());
    }

    #[test]
    fn test_long_flags() {
        let outcome = parser().parse("status --verbose --format=json --level 3 --no-color");
        let args = outcome.args;
        assert_eq!(args.command.as_deref(), Some("status"));
        assert!(args.flag("verbose"));
        assert_eq!(args.get_str("format"), Some("json"));
        assert_eq!(args.get_str("level"), Some("3"));
        assert_eq!(args.get("color"), Some(&ArgValue::Bool(false)));
        assert_eq!(args.positionals, vec!["status"]);
    }

    #[test]
    fn test_short_flags() {
        let outcome = parser().parse("status -vq -n 5");
        let args = outcome.args;
        assert!(args.flag("v"));
        assert!(args.flag("q"));
        assert_eq!(args.get_str("n"), Some("5"));
    }

    #[test]
    fn test_negative_number_is_positional() {
        let outcome = parser().parse("kick bob -5");
        assert_eq!(outcome.args.get_str("reason"), Some("-5"));
    }

    #[test]
    fn test_double_dash_ends_flags() {
        let outcome = parser().parse("say -- --not-a-flag");
        assert_eq!(outcome.args.rest(), ["--not-a-flag"]);
        assert!(outcome.args.get("not-a-flag").is_none());
    }

    #[test]
    fn test_repeated_flag_collects_list() {
        let outcome = parser().parse("status --tag a --tag b --tag c");
        assert_eq!(
            outcome.args.get("tag"),
            Some(&ArgValue::List(vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string()
            ]))
        );
    }

    #[test]
    fn test_lone_dash_is_positional() {
        let outcome = parser().parse("kick -");
        assert_eq!(outcome.args.get_str("user"), Some("-"));
    }

    #[test]
    fn test_empty_usage_falls_back_to_name() {
        let outcome = CommandLine::new().command("ping", "", "Ping").parse("ping");
        assert_eq!(outcome.args.command.as_deref(), Some("ping"));
    }

    #[test]
    fn test_help_is_aligned() {
        let help = parser().help();
        let lines: Vec<&str> = help.lines().collect();
        assert_eq!(lines[0], "Commands:");
        assert_eq!(
            lines[1],
            "  status                Find out about the current status of the bot"
        );
        assert_eq!(lines[2], "  kick <user> [reason]  Kick a member");
        assert_eq!(lines[3], "  say <words..>         Repeat after me");
    }

    #[test]
    fn test_help_without_commands() {
        assert_eq!(CommandLine::new().help(), "No commands are available here.");
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("status", "status"), 0);
        assert_eq!(levenshtein("statsu", "status"), 2);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
    }
}
