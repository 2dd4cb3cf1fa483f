//! Telegram transport module.
//!
//! Bot API dispatching for commands and inline buttons, and the
//! [`Notifier`](crate::scheduler::Notifier) used by the instance monitor.

mod bot;
mod markup;
mod notifier;

pub use bot::{BotError, register_commands, run};
pub use markup::inline_markup;
pub use notifier::TelegramNotifier;
