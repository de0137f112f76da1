//! Turning chat text into sub-command invocations.

pub mod parser;
pub mod tokenize;
pub mod usage;

pub use parser::{ArgValue, CommandLine, ParseOutcome, ParsedArgs};
pub use tokenize::tokenize;
pub use usage::{Positional, Usage};

/// Drop one leading `/` when it introduces a word (`/status` -> `status`).
/// A lone slash or `/ text` is left alone.
pub fn strip_command_prefix(content: &str) -> &str {
    match content.strip_prefix('/') {
        Some(rest) if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') => rest,
        _ => content,
    }
}
