//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod counter;

pub use user::User;
pub use message::Message;
pub use command::{Adjustment, MouseCommand, Tally};
pub use counter::{Applied, ChannelCounter, CounterMap, MessageId};
