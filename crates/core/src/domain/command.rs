//! Command text normalization
//!
//! Callers submit free-form command text such as `adb -s emulator-5554 shell ls "/sdcard/My Files"`.
//! The text is trimmed, a leading `adb` token is dropped (the executable is
//! resolved by configuration, never by the caller) and the rest is split into
//! arguments honoring single and double quotes.
//!
//! Backslash only escapes whitespace, quotes and another backslash, so Windows
//! style paths pass through untouched.

use super::error::{DomainError, Result};

const TOOL_PREFIX: &str = "adb";

/// Normalized command ready to hand to a process invoker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    text: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Parse caller-provided command text
    ///
    /// # Errors
    /// - `DomainError::UnterminatedQuote` if a quote is opened and never closed
    pub fn parse(text: &str) -> Result<Self> {
        let body = strip_tool_prefix(text.trim());
        let args = tokenize(body).map_err(|quote| DomainError::UnterminatedQuote {
            quote,
            command: text.to_string(),
        })?;

        Ok(Self {
            text: text.to_string(),
            args,
        })
    }

    /// Original command text, used for classification and diagnostics
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

fn strip_tool_prefix(text: &str) -> &str {
    if text == TOOL_PREFIX {
        return "";
    }
    match text.strip_prefix(TOOL_PREFIX) {
        Some(rest) if rest.starts_with(' ') => rest.trim_start(),
        _ => text,
    }
}

/// Split on whitespace, grouping quoted spans. Returns the open quote on failure.
fn tokenize(body: &str) -> std::result::Result<Vec<String>, char> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some('\'') => {
                if c == '\'' {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            Some(q) => {
                if c == q {
                    quote = None;
                } else if c == '\\' && matches!(chars.peek(), Some(&'"') | Some(&'\\')) {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                } else {
                    current.push(c);
                }
            }
            None => {
                if c.is_whitespace() {
                    if in_token {
                        args.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else if c == '"' || c == '\'' {
                    quote = Some(c);
                    in_token = true;
                } else if c == '\\'
                    && chars
                        .peek()
                        .is_some_and(|&n| n.is_whitespace() || matches!(n, '"' | '\'' | '\\'))
                {
                    in_token = true;
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                } else {
                    in_token = true;
                    current.push(c);
                }
            }
        }
    }

    if let Some(open) = quote {
        return Err(open);
    }
    if in_token {
        args.push(current);
    }
    Ok(args)
}
