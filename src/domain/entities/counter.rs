use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Adjustment, Tally};

/// Platform id of the rendered counter message
pub type MessageId = i64;

/// Channel id -> counter, in the shape persisted to disk
pub type CounterMap = BTreeMap<String, ChannelCounter>;

/// Per-channel mouse tally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounter {
    #[serde(rename = "counter_message")]
    pub message_id: MessageId,
    #[serde(rename = "human_mice")]
    pub human: u64,
    #[serde(rename = "cat_mice")]
    pub cat: u64,
}

/// Result of applying an adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub previous: u64,
    pub current: u64,
    /// The decrement would have gone below zero
    pub clamped: bool,
}

impl ChannelCounter {
    pub fn new(message_id: MessageId) -> Self {
        Self { message_id, human: 0, cat: 0 }
    }

    pub fn with_counts(mut self, human: u64, cat: u64) -> Self {
        self.human = human;
        self.cat = cat;
        self
    }

    fn slot(&mut self, tally: Tally) -> &mut u64 {
        match tally {
            Tally::Human => &mut self.human,
            Tally::Cat => &mut self.cat,
        }
    }

    pub fn apply(&mut self, tally: Tally, adjustment: Adjustment) -> Applied {
        let slot = self.slot(tally);
        let previous = *slot;
        let (current, clamped) = adjustment.apply_to(previous);
        *slot = current;
        Applied { previous, current, clamped }
    }

    pub fn reset(&mut self) {
        self.human = 0;
        self.cat = 0;
    }
}
