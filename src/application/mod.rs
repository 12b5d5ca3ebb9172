//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Counter state held for the running bot
//! - Render: Counter display payloads
//! - Errors: Domain-specific errors
//! - Messaging: Command parsing, middleware, dispatching

pub mod errors;
pub mod render;
pub mod services;
pub mod messaging;
