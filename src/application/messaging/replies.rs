//! User-facing reply texts

use crate::application::errors::CommandError;

pub const CREATING_NOTICE: &str =
    "No mouse counter for this channel previously existed; creating a new one";
pub const CLAMP_NOTICE: &str =
    "Can't reduce the number of mice below 0 (are you trying to break things?)";
pub const RESET_NOTICE: &str = "Resetting mousebot counter for this channel";
pub const GENERIC_FAILURE: &str = "Something went wrong; did you format your command properly?";
pub const EDIT_FAILURE: &str = "Something went wrong editing the mouse count";

/// Full help text
pub fn usage(prefix: &str) -> String {
    format!(
        "Hello, I'm mousebot :]

*Usage*
Mousebot counts are per-channel. Updating the mouse count in one channel does not affect the counts in other channels.

_Show help message_
`{p}` or `{p} help`

_Initialize the mouse counter for the channel_
`{p} init`
All further mousebot commands will update the counter post (you should pin this post to the channel for ease of use).

_Add a mouse_
`{p} +n`
If n is left blank, one mouse will be added (equivalent to `{p} +`).

_Remove a mouse_
`{p} -n`
If n is left blank, one mouse will be removed (equivalent to `{p} -`).

_Cat got a mouse_
`{p} cat +n`

_Cat mouse miscounted_
`{p} cat -n`

_Reset mouse counter for the channel_
`{p} reset`",
        p = prefix
    )
}

pub fn unknown_hint(prefix: &str) -> String {
    format!(
        "Something looks wrong with your command; try typing `{} help` for help",
        prefix
    )
}

pub fn cat_usage(prefix: &str) -> String {
    format!("Usage: `{p} cat +` or `{p} cat -`", p = prefix)
}

/// Reply sent back for a command the user got wrong
pub fn for_error(error: &CommandError, prefix: &str) -> String {
    match error {
        CommandError::MissingSubcommand => usage(prefix),
        CommandError::UnknownSubcommand(_) => unknown_hint(prefix),
        CommandError::InvalidMagnitude { usage, .. } => usage.clone(),
        CommandError::MissingCatDirection => cat_usage(prefix),
    }
}
