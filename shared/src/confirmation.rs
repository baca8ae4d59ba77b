use crate::types::Result;
use dialoguer::{theme::ColorfulTheme, Confirm};

/// Ask before a new archive replaces a conversation of `message_count`
/// entries. Defaults to yes so a bare Enter proceeds with the load.
pub fn confirm_discard_conversation(message_count: usize) -> Result<bool> {
    let noun = if message_count == 1 { "message" } else { "messages" };
    let proceed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Loading a new archive discards {message_count} {noun}. Continue?"
        ))
        .default(true)
        .wait_for_newline(true)
        .interact()?;
    Ok(proceed)
}
