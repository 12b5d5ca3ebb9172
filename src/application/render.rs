//! Counter rendering

use crate::domain::entities::ChannelCounter;

pub const COUNTER_TITLE: &str = "Mouse counter";

/// Display payload for a counter message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterView {
    pub title: String,
    pub fields: Vec<String>,
}

impl CounterView {
    /// Flatten for platforms without rich embeds
    pub fn to_text(&self) -> String {
        let mut text = self.title.clone();
        for field in &self.fields {
            text.push('\n');
            text.push_str(field);
        }
        text
    }
}

pub fn render(counter: &ChannelCounter) -> CounterView {
    render_counts(counter.human, counter.cat)
}

pub fn render_counts(human: u64, cat: u64) -> CounterView {
    CounterView {
        title: COUNTER_TITLE.to_string(),
        fields: vec![
            format!("Caught by humans: {}", human),
            format!("Caught by cats: {}", cat),
        ],
    }
}
