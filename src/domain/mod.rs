//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (ChannelCounter, MouseCommand, Message, User)
//! - Traits: Abstractions for infrastructure (Bot, CounterStore)

pub mod entities;
pub mod traits;
