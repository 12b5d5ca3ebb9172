//! Message dispatcher - Routes messages to the counter logic

use std::sync::Arc;
use crate::application::errors::{BotError, CommandError, StorageError};
use crate::application::render::{render, render_counts};
use crate::application::services::CounterBook;
use crate::domain::entities::{ChannelCounter, Message, MouseCommand};
use crate::domain::traits::Bot;
use super::middleware::{Context, Middleware, MiddlewareError, Next};
use super::parser::CommandParser;
use super::replies;

/// What happened to an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Filtered out or not addressed to the bot
    Ignored,
    Handled(MouseCommand),
    /// The user got the command wrong and was told how to fix it
    Rejected(CommandError),
    /// Something broke while handling; the user was told generically
    Failed,
}

/// Where a command broke, which decides what the user is told
enum Failure {
    Posting(BotError),
    Editing(BotError),
}

impl Failure {
    fn reply(&self) -> &'static str {
        match self {
            Failure::Posting(_) => replies::GENERIC_FAILURE,
            Failure::Editing(_) => replies::EDIT_FAILURE,
        }
    }

    fn source(&self) -> &BotError {
        match self {
            Failure::Posting(e) | Failure::Editing(e) => e,
        }
    }
}

impl From<BotError> for Failure {
    fn from(e: BotError) -> Self {
        Failure::Posting(e)
    }
}

impl From<StorageError> for Failure {
    fn from(e: StorageError) -> Self {
        Failure::Posting(BotError::Storage(e))
    }
}

/// Message dispatcher - runs middleware, interprets commands, keeps counters
pub struct MessageDispatcher {
    parser: CommandParser,
    middleware: Vec<Arc<dyn Middleware>>,
    counters: CounterBook,
}

impl MessageDispatcher {
    pub fn new(prefix: impl Into<String>, counters: CounterBook) -> Self {
        Self {
            parser: CommandParser::new(prefix),
            middleware: Vec::new(),
            counters,
        }
    }

    /// Only answer `prefix@username` mentions that name this bot
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.parser = self.parser.with_bot_username(username);
        self
    }

    /// Add middleware to the chain
    pub fn with_middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn counters(&self) -> &CounterBook {
        &self.counters
    }

    pub fn prefix(&self) -> &str {
        self.parser.prefix()
    }

    /// Handle one inbound message. Errors are reported to the chat, never returned.
    pub async fn process<B: Bot + ?Sized>(&mut self, bot: &B, message: Message) -> Dispatch {
        let ctx = match Next::new(self.middleware.clone()).run(Context::new(message)) {
            Ok(ctx) => ctx,
            Err(MiddlewareError::Blocked(_)) => return Dispatch::Ignored,
            Err(MiddlewareError::Internal(e)) => {
                tracing::error!("Middleware failed: {}", e);
                return Dispatch::Failed;
            }
        };

        let Some(parsed) = self.parser.parse(&ctx.message.text) else {
            return Dispatch::Ignored;
        };
        let chat_id = ctx.chat_id;

        let command = match parsed {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!("[{}] Rejected command: {}", chat_id, e);
                let reply = replies::for_error(&e, self.parser.prefix());
                if let Err(send_err) = bot.send_message(&chat_id, &reply).await {
                    tracing::error!("[{}] Failed to send usage: {}", chat_id, send_err);
                }
                return Dispatch::Rejected(e);
            }
        };

        match self.execute(bot, &chat_id, command).await {
            Ok(()) => Dispatch::Handled(command),
            Err(failure) => {
                tracing::error!("[{}] {:?} failed: {}", chat_id, command, failure.source());
                self.report_failure(bot, &chat_id, &failure).await;
                Dispatch::Failed
            }
        }
    }

    async fn execute<B: Bot + ?Sized>(&mut self, bot: &B, chat_id: &str, command: MouseCommand) -> Result<(), Failure> {
        match command {
            MouseCommand::Help => {
                bot.send_message(chat_id, &replies::usage(self.parser.prefix())).await?;
            }
            MouseCommand::Init => {
                self.create(bot, chat_id, ChannelCounter::new(0)).await?;
            }
            MouseCommand::Reset => {
                bot.send_message(chat_id, replies::RESET_NOTICE).await?;
                match self.counters.reset(chat_id)? {
                    Some(counter) => self.refresh(bot, chat_id, &counter).await?,
                    None => self.create(bot, chat_id, ChannelCounter::new(0)).await?,
                }
            }
            MouseCommand::Adjust { tally, adjustment } => {
                match self.counters.adjust(chat_id, tally, adjustment)? {
                    Some((counter, applied)) => {
                        tracing::info!(
                            "[{}] {} mice {} -> {} ({})",
                            chat_id, tally.as_str(), applied.previous, applied.current, adjustment
                        );
                        if applied.clamped {
                            bot.send_message(chat_id, replies::CLAMP_NOTICE).await?;
                        }
                        self.refresh(bot, chat_id, &counter).await?;
                    }
                    None => {
                        bot.send_message(chat_id, replies::CREATING_NOTICE).await?;
                        let mut fresh = ChannelCounter::new(0);
                        if fresh.apply(tally, adjustment).clamped {
                            bot.send_message(chat_id, replies::CLAMP_NOTICE).await?;
                        }
                        self.create(bot, chat_id, fresh).await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Post a new counter message and make it the channel's counter
    async fn create<B: Bot + ?Sized>(&mut self, bot: &B, chat_id: &str, counts: ChannelCounter) -> Result<(), Failure> {
        let message_id = bot.send_counter(chat_id, &render_counts(counts.human, counts.cat)).await?;
        let counter = ChannelCounter::new(message_id).with_counts(counts.human, counts.cat);
        self.counters.insert(chat_id, counter)?;
        tracing::info!("[{}] New counter message {}", chat_id, message_id);
        Ok(())
    }

    async fn refresh<B: Bot + ?Sized>(&self, bot: &B, chat_id: &str, counter: &ChannelCounter) -> Result<(), Failure> {
        bot.edit_counter(chat_id, counter.message_id, &render(counter))
            .await
            .map_err(Failure::Editing)
    }

    async fn report_failure<B: Bot + ?Sized>(&self, bot: &B, chat_id: &str, failure: &Failure) {
        let usage = replies::usage(self.parser.prefix());
        for text in [failure.reply(), usage.as_str()] {
            if let Err(e) = bot.send_message(chat_id, text).await {
                tracing::warn!("[{}] Could not report failure: {}", chat_id, e);
                break;
            }
        }
    }
}
