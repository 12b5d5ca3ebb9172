//! Message handling - Event-driven message processing

pub mod dispatcher;
pub mod middleware;
pub mod parser;
pub mod replies;

pub use dispatcher::{Dispatch, MessageDispatcher};
pub use middleware::{DebugChannelMiddleware, LoggingMiddleware, Middleware, MiddlewareChain, SelfMessageMiddleware};
pub use parser::CommandParser;
