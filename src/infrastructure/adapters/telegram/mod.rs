//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::application::render::CounterView;
use crate::domain::entities::{self, MessageId};
use crate::domain::traits::{Bot, BotInfo};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Returned by editMessageText when the new text equals the old one
const NOT_MODIFIED: &str = "message is not modified";

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    pub title: Option<String>,
    pub username: Option<String>,
}

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct MessageResult {
    message_id: i64,
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "mousebot".to_string(),
                username: "mousebot".to_string(),
            },
        }
    }

    /// First characters of the token, safe to log
    fn token_preview(&self) -> String {
        self.token.chars().take(8).collect()
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    /// POST a Bot API method and unwrap its `result`
    async fn call<Req, T>(&self, method: &str, request: &Req) -> Result<T, BotError>
    where
        Req: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client
            .post(self.api_url(method))
            .json(request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        let data: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(format!("{} ({}): {}", method, status, e)))?;

        if !data.ok {
            return Err(BotError::Network(format!(
                "Telegram API error in {}: {}",
                method,
                data.description.unwrap_or_else(|| status.to_string())
            )));
        }

        data.result
            .ok_or_else(|| BotError::Parse(format!("{}: response without result", method)))
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: Option<String>,
        }

        let me: BotInfoResponse = self.call("getMe", &serde_json::json!({})).await?;
        self.info = BotInfo {
            id: me.id.to_string(),
            username: me.username.unwrap_or_else(|| me.first_name.clone()),
            name: me.first_name,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        self.call("getUpdates", &request).await
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update], current: i64) -> i64 {
        updates.iter()
            .map(|u| u.update_id + 1)
            .max()
            .unwrap_or(current)
    }

    /// Convert a Telegram message into the platform-neutral form
    pub fn to_message(msg: &Message) -> Option<entities::Message> {
        let text = msg.text.as_deref()?;

        let sender = msg.from.as_ref().map(|u| {
            let mut user = entities::User::new(u.id.to_string());
            user.username = u.username.clone();
            user.first_name = u.first_name.clone();
            user.is_bot = u.is_bot;
            user
        });

        let mut message = entities::Message::new(msg.chat.id.to_string(), text)
            .with_id(msg.message_id.to_string())
            .with_sender_opt(sender)
            .with_platform("telegram");
        if let Some(name) = msg.chat.title.as_ref().or(msg.chat.username.as_ref()) {
            message = message.with_chat_name(name.clone());
        }
        Some(message)
    }

    /// Send a message with specific parse mode
    pub async fn send_message_with_format(&self, chat_id: &str, text: &str, parse_mode: Option<&str>) -> Result<MessageId, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<&'a str>,
        }

        let request = SendMessageRequest { chat_id, text, parse_mode };
        let result: MessageResult = self.call("sendMessage", &request).await?;
        Ok(result.message_id)
    }

    /// Send with Markdown, falling back to plain text if Telegram rejects the markup
    pub async fn send_message_api(&self, chat_id: &str, text: &str) -> Result<MessageId, BotError> {
        match self.send_message_with_format(chat_id, text, Some("Markdown")).await {
            Ok(id) => Ok(id),
            Err(e) => {
                tracing::warn!("Markdown failed, using plain text: {}", e);
                self.send_message_with_format(chat_id, text, None).await
            }
        }
    }

    /// Replace the text of an existing message
    pub async fn edit_message_text(&self, chat_id: &str, message_id: MessageId, text: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct EditMessageRequest<'a> {
            chat_id: &'a str,
            message_id: MessageId,
            text: &'a str,
            parse_mode: &'a str,
        }

        let request = EditMessageRequest {
            chat_id,
            message_id,
            text,
            parse_mode: "Markdown",
        };

        match self.call::<_, serde_json::Value>("editMessageText", &request).await {
            Ok(_) => Ok(()),
            Err(BotError::Network(e)) if e.contains(NOT_MODIFIED) => {
                tracing::debug!("Counter {} unchanged", message_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Register the bot command with Telegram so clients can autocomplete it
    pub async fn register_commands(&self, prefix: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Command {
            command: String,
            description: String,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest {
            commands: Vec<Command>,
        }

        let request = SetMyCommandsRequest {
            commands: vec![Command {
                command: prefix.trim_start_matches('/').to_string(),
                description: "Count mice: help, init, reset, +n, -n, cat +n, cat -n".to_string(),
            }],
        };

        let _: bool = self.call("setMyCommands", &request).await?;
        tracing::info!("Registered bot commands with Telegram");
        Ok(())
    }

    fn counter_text(view: &CounterView) -> String {
        let mut text = format!("*{}*", view.title);
        for field in &view.fields {
            text.push('\n');
            text.push_str(field);
        }
        text
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting Telegram bot (token: {}...)", self.token_preview());
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageId, BotError> {
        tracing::debug!("Sending to {}: {}", chat_id, text);

        match self.send_message_api(chat_id, text).await {
            Ok(msg_id) => Ok(msg_id),
            Err(e) => {
                tracing::error!("Failed to send message: {}", e);
                Err(e)
            }
        }
    }

    async fn send_counter(&self, chat_id: &str, view: &CounterView) -> Result<MessageId, BotError> {
        self.send_message_api(chat_id, &Self::counter_text(view)).await
    }

    async fn edit_counter(&self, chat_id: &str, message_id: MessageId, view: &CounterView) -> Result<(), BotError> {
        self.edit_message_text(chat_id, message_id, &Self::counter_text(view)).await
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
