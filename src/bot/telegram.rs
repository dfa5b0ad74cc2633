//! Telegram transport: the `BotApi` seam and its teloxide implementation.

use std::future::Future;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, LinkPreviewOptions, MessageId, ParseMode, ReplyMarkup, ReplyParameters};
use tracing::{info, warn};

use crate::bot::error::BotError;

/// Outbound calls the controller makes. All text is sent as HTML with link
/// previews disabled.
pub trait BotApi: Send + Sync {
    /// Send a message and return its id.
    fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
        reply_to_message_id: Option<i64>,
    ) -> impl Future<Output = Result<i64, BotError>> + Send;

    fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> impl Future<Output = Result<(), BotError>> + Send;

    fn delete_message(&self, chat_id: i64, message_id: i64) -> impl Future<Output = Result<(), BotError>> + Send;

    fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> impl Future<Output = Result<(), BotError>> + Send;

    /// Download URL for an uploaded file.
    fn file_url(&self, file_id: &str) -> impl Future<Output = Result<String, BotError>> + Send;
}

fn no_link_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

fn telegram_message_id(id: i64) -> Result<MessageId, BotError> {
    i32::try_from(id).map(MessageId).map_err(|_| BotError::InvalidMessageId(id))
}

/// Public download URL of a file already resolved by `getFile`.
pub fn file_download_url(token: &str, path: &str) -> String {
    format!("https://api.telegram.org/file/bot{token}/{path}")
}

fn transport_error(action: &str, e: impl std::fmt::Display) -> BotError {
    let msg = format!("Failed to {action}: {e}");
    warn!("{}", msg);
    BotError::Transport(msg)
}

/// Telegram API client.
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl BotApi for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
        reply_to_message_id: Option<i64>,
    ) -> Result<i64, BotError> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_link_preview());

        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }

        if let Some(msg_id) = reply_to_message_id {
            let reply_params = ReplyParameters::new(telegram_message_id(msg_id)?);
            request = request.reply_parameters(reply_params);
        }

        request
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| transport_error("send", e))
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), BotError> {
        let mut request = self
            .bot
            .edit_message_text(ChatId(chat_id), telegram_message_id(message_id)?, text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_link_preview());

        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }

        request.await.map_err(|e| transport_error("edit message", e))?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), BotError> {
        info!("🗑️ Deleting message {} in chat {}", message_id, chat_id);

        self.bot
            .delete_message(ChatId(chat_id), telegram_message_id(message_id)?)
            .await
            .map_err(|e| transport_error("delete message", e))?;

        Ok(())
    }

    async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), BotError> {
        let mut request = self.bot.answer_callback_query(teloxide::types::CallbackQueryId(callback_query_id.to_string()));

        if let Some(text) = text {
            request = request.text(text);
        }
        if show_alert {
            request = request.show_alert(true);
        }

        request.await.map_err(|e| transport_error("answer callback", e))?;
        Ok(())
    }

    async fn file_url(&self, file_id: &str) -> Result<String, BotError> {
        let file = self
            .bot
            .get_file(teloxide::types::FileId(file_id.to_string()))
            .await
            .map_err(|e| transport_error("get file info", e))?;

        Ok(file_download_url(self.bot.token(), &file.path))
    }
}
