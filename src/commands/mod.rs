//! Command handling module.
//!
//! Parses slash commands and inline button payloads, checks the caller
//! against the allow-lists, and produces transport-neutral replies.

mod handler;
mod types;

pub use handler::{ACCESS_DENIED, Caller, CommandHandler, INVALID_REQUEST};
pub use types::{
    BotCommand, Button, CallbackAction, CommandResult, Keyboard, is_valid_instance_id,
};
