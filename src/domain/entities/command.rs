use std::fmt;

/// Which of the two counts a command touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tally {
    Human,
    Cat,
}

impl Tally {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tally::Human => "human",
            Tally::Cat => "cat",
        }
    }
}

/// Signed change requested by `+n` / `-n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Add(u64),
    Remove(u64),
}

impl Adjustment {
    /// Apply to a count. Returns the new value and whether it was clamped at zero.
    pub fn apply_to(self, count: u64) -> (u64, bool) {
        match self {
            Adjustment::Add(n) => (count.saturating_add(n), false),
            Adjustment::Remove(n) => match count.checked_sub(n) {
                Some(value) => (value, false),
                None => (0, true),
            },
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::Add(n) => write!(f, "+{}", n),
            Adjustment::Remove(n) => write!(f, "-{}", n),
        }
    }
}

/// Intent parsed from a `/mousebot ...` message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseCommand {
    Help,
    Init,
    Reset,
    Adjust { tally: Tally, adjustment: Adjustment },
}

impl MouseCommand {
    pub fn human(adjustment: Adjustment) -> Self {
        MouseCommand::Adjust { tally: Tally::Human, adjustment }
    }

    pub fn cat(adjustment: Adjustment) -> Self {
        MouseCommand::Adjust { tally: Tally::Cat, adjustment }
    }
}
