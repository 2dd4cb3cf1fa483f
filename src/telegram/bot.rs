//! Update dispatching.
//!
//! Messages and callback queries are routed to the shared
//! [`CommandHandler`]; replies go back as HTML. Updates from one chat are
//! processed one at a time.

use std::net::SocketAddr;
use std::sync::Arc;

use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand as MenuCommand, CallbackQuery, ChatId, MessageId, ParseMode, Update,
};
use teloxide::update_listeners::webhooks;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::markup::inline_markup;
use crate::commands::{BotCommand, Caller, CommandHandler, CommandResult};
use crate::config::WebhookConfig;
use crate::report::{MESSAGE_LIMIT, split_message};

/// Errors that can stop the bot from starting.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Invalid webhook URL {url}: {reason}")]
    InvalidWebhookUrl { url: String, reason: String },

    #[error("Failed to start webhook listener: {0}")]
    Webhook(String),
}

/// Publishes the command menu. Failure is not fatal.
pub async fn register_commands(bot: &Bot) {
    let commands: Vec<MenuCommand> = BotCommand::all_commands()
        .iter()
        .map(|c| MenuCommand::new(c.name(), c.description()))
        .collect();

    match bot.set_my_commands(commands).await {
        Ok(_) => debug!("Command menu registered"),
        Err(e) => warn!("Failed to register command menu: {}", e),
    }
}

/// Runs the dispatcher until Ctrl+C.
///
/// Uses long polling, or a webhook listener when `webhook` is set.
pub async fn run(
    bot: Bot,
    handler: Arc<CommandHandler>,
    webhook: Option<WebhookConfig>,
    token: &str,
) -> Result<(), BotError> {
    let tree = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    let mut dispatcher = Dispatcher::builder(bot.clone(), tree)
        .dependencies(dptree::deps![handler])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.kind);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in update handler",
        ))
        .enable_ctrlc_handler()
        .build();

    match webhook {
        None => {
            info!("Starting dispatcher with long polling");
            dispatcher.dispatch().await;
        }
        Some(config) => {
            let raw = format!("{}/{token}", config.url.trim_end_matches('/'));
            let url = reqwest::Url::parse(&raw).map_err(|e| BotError::InvalidWebhookUrl {
                url: config.url.clone(),
                reason: e.to_string(),
            })?;
            let address = SocketAddr::from(([0, 0, 0, 0], config.port));

            let listener = webhooks::axum(bot, webhooks::Options::new(address, url))
                .await
                .map_err(|e| BotError::Webhook(e.to_string()))?;

            info!("Starting dispatcher with webhook on port {}", config.port);
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("Error in webhook listener"),
                )
                .await;
        }
    }

    info!("Dispatcher stopped");
    Ok(())
}

async fn message_handler(
    bot: Bot,
    msg: Message,
    handler: Arc<CommandHandler>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let user_id = msg
        .from
        .as_ref()
        .map_or(0, |u| i64::try_from(u.id.0).unwrap_or_default());
    let caller = Caller::new(user_id, msg.chat.id.0);

    if let Some(result) = handler.try_handle(caller, text).await {
        send_reply(&bot, msg.chat.id, result).await?;
    }

    Ok(())
}

async fn callback_handler(
    bot: Bot,
    query: CallbackQuery,
    handler: Arc<CommandHandler>,
) -> ResponseResult<()> {
    let Some(data) = query.data.as_deref() else {
        bot.answer_callback_query(&query.id).await?;
        return Ok(());
    };
    let Some(message) = query.message.as_ref() else {
        bot.answer_callback_query(&query.id).await?;
        return Ok(());
    };

    let chat_id = message.chat().id;
    let message_id = message.id();
    let user_id = i64::try_from(query.from.id.0).unwrap_or_default();
    let caller = Caller::new(user_id, chat_id.0);

    let action = match handler.prepare_callback(caller, data) {
        Ok(action) => action,
        Err(result) => {
            bot.answer_callback_query(&query.id)
                .text(result.message)
                .await?;
            return Ok(());
        }
    };

    bot.answer_callback_query(&query.id).await?;

    if let Some(progress) = action.progress_text() {
        edit_reply(&bot, chat_id, message_id, CommandResult::success(progress)).await;
    }

    let result = handler.execute_callback(caller, action).await;
    edit_reply(&bot, chat_id, message_id, result).await;

    Ok(())
}

/// Sends a reply, split into chunks when long. The keyboard goes on the
/// last chunk.
async fn send_reply(bot: &Bot, chat_id: ChatId, result: CommandResult) -> ResponseResult<()> {
    let mut chunks = split_message(&result.message, MESSAGE_LIMIT);
    let last = chunks.pop().unwrap_or_default();

    for chunk in chunks {
        bot.send_message(chat_id, chunk)
            .parse_mode(ParseMode::Html)
            .await?;
    }

    let request = bot.send_message(chat_id, last).parse_mode(ParseMode::Html);
    match &result.keyboard {
        Some(keyboard) => request.reply_markup(inline_markup(keyboard)).await?,
        None => request.await?,
    };

    Ok(())
}

/// Replaces the pressed message with the reply. Edit failures are logged.
async fn edit_reply(bot: &Bot, chat_id: ChatId, message_id: MessageId, result: CommandResult) {
    let request = bot
        .edit_message_text(chat_id, message_id, result.message)
        .parse_mode(ParseMode::Html);

    let outcome = match &result.keyboard {
        Some(keyboard) => request.reply_markup(inline_markup(keyboard)).await,
        None => request.await,
    };

    if let Err(e) = outcome {
        warn!(
            "Failed to edit message {} in chat {}: {}",
            message_id.0, chat_id.0, e
        );
    }
}
