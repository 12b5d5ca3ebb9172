use async_trait::async_trait;
use crate::application::errors::BotError;
use crate::application::render::CounterView;
use crate::domain::entities::MessageId;

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Start the bot and begin listening for messages
    async fn start(&self) -> Result<(), BotError>;

    /// Send a plain text message to a chat
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageId, BotError>;

    /// Post a rendered counter, returning the id of the new message
    async fn send_counter(&self, chat_id: &str, view: &CounterView) -> Result<MessageId, BotError>;

    /// Replace the content of a previously posted counter
    async fn edit_counter(&self, chat_id: &str, message_id: MessageId, view: &CounterView) -> Result<(), BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
