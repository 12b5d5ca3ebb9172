//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Counter persistence
//! - Adapters: Platform integrations (Telegram, console)

pub mod config;
pub mod storage;
pub mod adapters;
