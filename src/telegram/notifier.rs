//! Telegram delivery of monitor notifications.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};

use crate::report::{MESSAGE_LIMIT, split_message};
use crate::scheduler::{Notifier, NotifyError};

/// Sends notifications to one fixed chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    #[must_use]
    pub const fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        for chunk in split_message(text, MESSAGE_LIMIT) {
            self.bot
                .send_message(self.chat_id, chunk)
                .parse_mode(ParseMode::Html)
                .await
                .map_err(|e| NotifyError::Send(e.to_string()))?;
        }
        Ok(())
    }
}
