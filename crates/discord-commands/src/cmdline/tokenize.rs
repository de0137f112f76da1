//! Shell-like splitting of chat text into argument tokens.

/// Split `input` on whitespace, honouring single and double quotes.
///
/// Quotes group words and are removed; inside double quotes `\"` and `\\`
/// are escapes. An unterminated quote runs to the end of the input.
/// Backslashes outside double quotes are kept literally.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => match chars.peek() {
                Some(&next) if next == '"' || next == '\\' => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push(c),
            },
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}
