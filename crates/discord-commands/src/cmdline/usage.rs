//! Usage patterns: `word <required> [optional] <rest..>`

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Positional {
    pub name: String,
    pub required: bool,
    /// Swallows every remaining positional (`<name..>` / `[name..]`).
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    /// The word that selects this command.
    pub word: String,
    pub positionals: Vec<Positional>,
    raw: String,
}

impl Usage {
    /// Parse a usage pattern. Parsing never fails: a bare word after the
    /// command word is taken as a required positional of that name.
    pub fn parse(pattern: &str) -> Self {
        let mut parts = pattern.split_whitespace();
        let word = parts.next().unwrap_or_default().to_string();
        let positionals = parts.map(parse_positional).collect();
        Self {
            word,
            positionals,
            raw: pattern.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }

    /// Number of positionals that must follow the command word.
    pub fn required_count(&self) -> usize {
        self.positionals.iter().filter(|p| p.required).count()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_positional(token: &str) -> Positional {
    let (inner, required) = if let Some(inner) = token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
    {
        (inner, true)
    } else if let Some(inner) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        (inner, false)
    } else {
        (token, true)
    };

    let (name, variadic) = match inner.strip_suffix("..") {
        Some(name) => (name, true),
        None => (inner, false),
    };

    Positional {
        name: name.to_string(),
        required,
        variadic,
    }
}
