//! Middleware system for message processing pipeline

use std::sync::Arc;
use crate::domain::entities::Message;

/// Context passed through middleware chain
#[derive(Debug, Clone)]
pub struct Context {
    pub message: Message,
    pub chat_id: String,
    pub user_id: Option<String>,
}

impl Context {
    pub fn new(message: Message) -> Self {
        let chat_id = message.chat_id.clone();
        let user_id = message.sender.as_ref().map(|u| u.id.clone());

        Self {
            message,
            chat_id,
            user_id,
        }
    }
}

/// Middleware trait - processors that can intercept message handling
pub trait Middleware: Send + Sync {
    /// Inspect the context and either pass it on or stop the chain
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult;
}

/// Result of middleware processing
pub type MiddlewareResult = Result<Context, MiddlewareError>;

/// Middleware errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiddlewareError {
    /// Drop the message silently
    Blocked(String),
    /// Internal error
    Internal(String),
}

impl std::fmt::Display for MiddlewareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MiddlewareError::Blocked(msg) => write!(f, "Blocked: {}", msg),
            MiddlewareError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for MiddlewareError {}

/// Next middleware in chain
#[derive(Clone)]
pub struct Next {
    remaining: Arc<[Arc<dyn Middleware>]>,
}

impl Next {
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            remaining: middlewares.into(),
        }
    }

    /// Process remaining middleware
    pub fn run(self, ctx: Context) -> MiddlewareResult {
        match self.remaining.split_first() {
            Some((first, rest)) => {
                let next = Next { remaining: rest.into() };
                first.process(ctx, next)
            }
            None => Ok(ctx),
        }
    }
}

/// Middleware chain builder
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn build(self) -> Vec<Arc<dyn Middleware>> {
        self.middlewares
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops messages the bot sent itself
pub struct SelfMessageMiddleware {
    bot_id: String,
}

impl SelfMessageMiddleware {
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self { bot_id: bot_id.into() }
    }
}

impl Middleware for SelfMessageMiddleware {
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult {
        if ctx.user_id.as_deref() == Some(self.bot_id.as_str()) {
            return Err(MiddlewareError::Blocked("own message".to_string()));
        }
        next.run(ctx)
    }
}

/// Debug mode: only the named channel is served
pub struct DebugChannelMiddleware {
    channel: String,
}

impl DebugChannelMiddleware {
    pub fn new(channel: impl Into<String>) -> Self {
        Self { channel: channel.into() }
    }
}

impl Middleware for DebugChannelMiddleware {
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult {
        if ctx.message.chat_name.as_deref() != Some(self.channel.as_str()) {
            return Err(MiddlewareError::Blocked(format!(
                "debug mode, ignoring channel {}",
                ctx.message.channel_label()
            )));
        }
        next.run(ctx)
    }
}

/// Logging middleware for debugging
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult {
        let preview: String = ctx.message.text.chars().take(50).collect();
        let author = ctx.message.sender.as_ref().map(|u| u.display_name()).unwrap_or_default();

        tracing::debug!(
            "[{}] {} message {} from {}: {}",
            ctx.chat_id, ctx.message.platform, ctx.message.id, author, preview
        );

        let chat_id = ctx.chat_id.clone();
        let result = next.run(ctx);

        if let Err(e) = &result {
            tracing::debug!("[{}] {}", chat_id, e);
        }

        result
    }
}
