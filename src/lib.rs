//! mousebot - counts the mice caught by humans and cats, per chat channel

pub mod domain;
pub mod application;
pub mod infrastructure;
