//! Application services - Counter state for the running bot

pub mod counter_book;

pub use counter_book::CounterBook;
