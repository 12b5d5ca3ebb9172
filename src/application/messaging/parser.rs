//! Command parser - Turns `/mousebot ...` text into a [`MouseCommand`]

use crate::application::errors::CommandError;
use crate::domain::entities::{Adjustment, MouseCommand};

/// Parses message text addressed to the bot
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: String,
    bot_username: Option<String>,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            bot_username: None,
        }
    }

    /// Accept `/prefix@username` addressed to this bot
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns `None` when the text is not a command for this bot.
    pub fn parse(&self, text: &str) -> Option<Result<MouseCommand, CommandError>> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?;
        // Telegram addresses commands in groups as `/cmd@botname`
        let (head, mention) = match head.split_once('@') {
            Some((head, mention)) => (head, Some(mention)),
            None => (head, None),
        };
        if head != self.prefix {
            return None;
        }
        if mention.is_some_and(|m| !self.is_own_mention(m)) {
            return None;
        }

        let Some(sub) = parts.next() else {
            return Some(Err(CommandError::MissingSubcommand));
        };

        Some(self.parse_subcommand(sub, parts.next()))
    }

    fn is_own_mention(&self, mention: &str) -> bool {
        self.bot_username
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(mention))
    }

    fn parse_subcommand(&self, sub: &str, next: Option<&str>) -> Result<MouseCommand, CommandError> {
        if let Some(adjustment) = self.parse_adjustment(sub, "")? {
            return Ok(MouseCommand::human(adjustment));
        }

        match sub.to_lowercase().as_str() {
            "help" => Ok(MouseCommand::Help),
            "init" => Ok(MouseCommand::Init),
            "reset" => Ok(MouseCommand::Reset),
            "cat" => {
                let token = next.ok_or(CommandError::MissingCatDirection)?;
                self.parse_adjustment(token, "cat ")?
                    .map(MouseCommand::cat)
                    .ok_or(CommandError::MissingCatDirection)
            }
            _ => Err(CommandError::UnknownSubcommand(sub.to_string())),
        }
    }

    /// `Ok(None)` if the token is not signed at all
    fn parse_adjustment(&self, token: &str, scope: &str) -> Result<Option<Adjustment>, CommandError> {
        let (sign, build) = match token.chars().next() {
            Some('+') => ('+', Adjustment::Add as fn(u64) -> Adjustment),
            Some('-') => ('-', Adjustment::Remove as fn(u64) -> Adjustment),
            _ => return Ok(None),
        };

        let digits = token.trim_start_matches(sign);
        if digits.is_empty() {
            return Ok(Some(build(1)));
        }

        let invalid = || CommandError::InvalidMagnitude {
            value: digits.to_string(),
            usage: format!("Usage: `{} {}{}`", self.prefix, scope, sign),
        };
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        digits.parse::<u64>().map(|n| Some(build(n))).map_err(|_| invalid())
    }
}
