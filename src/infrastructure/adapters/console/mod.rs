//! Console adapter for development/testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use crate::application::errors::BotError;
use crate::application::render::CounterView;
use crate::domain::entities::{Message, MessageId, User};
use crate::domain::traits::{Bot, BotInfo};

/// Channel used when a line does not name one
pub const DEFAULT_CHANNEL: &str = "console";

/// Console bot adapter for local development.
///
/// Each stdin line is a message. A leading `#name` picks the channel, so
/// `#testing /mousebot +` counts in channel `testing`.
pub struct ConsoleAdapter {
    info: BotInfo,
    next_id: AtomicI64,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "mousebot".to_string(),
                username: "console".to_string(),
            },
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate_id(&self) -> MessageId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Turn an input line into a message; blank lines yield nothing
    pub fn parse_line(line: &str) -> Option<Message> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (channel, text) = match line.strip_prefix('#') {
            Some(rest) => {
                let (channel, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                (channel, text.trim())
            }
            None => (DEFAULT_CHANNEL, line),
        };
        if channel.is_empty() || text.is_empty() {
            return None;
        }

        Some(
            Message::new(channel, text)
                .with_chat_name(channel)
                .with_sender(User::new("local").with_username("you"))
                .with_platform("console"),
        )
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageId, BotError> {
        println!("[BOT #{}] {}", chat_id, text);
        Ok(self.allocate_id())
    }

    async fn send_counter(&self, chat_id: &str, view: &CounterView) -> Result<MessageId, BotError> {
        let id = self.allocate_id();
        println!("[BOT #{} msg {}]\n{}", chat_id, id, view.to_text());
        Ok(id)
    }

    async fn edit_counter(&self, chat_id: &str, message_id: MessageId, view: &CounterView) -> Result<(), BotError> {
        println!("[BOT #{} edit msg {}]\n{}", chat_id, message_id, view.to_text());
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
