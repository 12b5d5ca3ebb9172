use super::User;

/// An inbound chat message, already stripped of platform specifics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    /// Stable channel identifier; counters are keyed by it
    pub chat_id: String,
    /// Human readable channel name (group title, username, ...)
    pub chat_name: Option<String>,
    pub sender: Option<User>,
    pub text: String,
    pub platform: String,
}

impl Message {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            chat_id: chat_id.into(),
            chat_name: None,
            sender: None,
            text: text.into(),
            platform: "unknown".to_string(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_chat_name(mut self, name: impl Into<String>) -> Self {
        self.chat_name = Some(name.into());
        self
    }

    pub fn with_sender(mut self, user: User) -> Self {
        self.sender = Some(user);
        self
    }

    pub fn with_sender_opt(mut self, user: Option<User>) -> Self {
        if let Some(u) = user {
            self.sender = Some(u);
        }
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Channel name if known, otherwise the channel id
    pub fn channel_label(&self) -> &str {
        self.chat_name.as_deref().unwrap_or(&self.chat_id)
    }
}
