//! Per-event controller: user record, conversation step, message helpers.

use teloxide::types::{InlineKeyboardButton, KeyboardButton, ReplyMarkup};
use tracing::debug;

use crate::bot::database::{BotUser, Database, Vacancy};
use crate::bot::error::BotError;
use crate::bot::event::Incoming;
use crate::bot::format::format_positional;
use crate::bot::keyboard::{InlineKeyboard, ReplyKeyboard};
use crate::bot::messages;
use crate::bot::steps::{BotUserStep, CallbackData, VacancyStatus};
use crate::bot::telegram::BotApi;

/// Where the text of an outgoing message comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageText {
    /// Catalog code.
    Code(String),
    /// Literal text.
    Raw(String),
}

/// An outgoing message. Unset targets default to the triggering event.
#[derive(Debug, Clone)]
pub struct Outgoing {
    text: MessageText,
    args: Vec<String>,
    markup: Option<ReplyMarkup>,
    chat_id: Option<i64>,
    message_id: Option<i64>,
    reply_to: Option<i64>,
    as_reply: bool,
}

impl Outgoing {
    fn with_text(text: MessageText) -> Self {
        Self {
            text,
            args: Vec::new(),
            markup: None,
            chat_id: None,
            message_id: None,
            reply_to: None,
            as_reply: false,
        }
    }

    pub fn code(code: impl Into<String>) -> Self {
        Self::with_text(MessageText::Code(code.into()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_text(MessageText::Raw(text.into()))
    }

    /// Positional argument for the template.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.markup = Some(markup.into());
        self
    }

    pub fn chat(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    /// Message to edit.
    pub fn message(mut self, message_id: i64) -> Self {
        self.message_id = Some(message_id);
        self
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    /// Reply to the triggering message unless `reply_to` names another.
    pub fn as_reply(mut self) -> Self {
        self.as_reply = true;
        self
    }
}

/// A message the bot sent or edited.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
}

/// How to acknowledge a button press.
#[derive(Debug, Clone, Default)]
pub struct CallbackAnswer {
    query_id: Option<String>,
    text: Option<String>,
    code: Option<String>,
    show_alert: bool,
}

impl CallbackAnswer {
    /// Acknowledge without showing anything.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }

    pub fn code(code: impl Into<String>) -> Self {
        Self { code: Some(code.into()), ..Self::default() }
    }

    /// Show a modal alert instead of a toast.
    pub fn alert(mut self) -> Self {
        self.show_alert = true;
        self
    }

    /// Answer a different callback query than the current one.
    pub fn query(mut self, query_id: impl Into<String>) -> Self {
        self.query_id = Some(query_id.into());
        self
    }
}

/// Handles one inbound event on behalf of its sender.
pub struct ChatController<'a, A: BotApi> {
    api: &'a A,
    db: &'a Database,
    event: Incoming,
    user: BotUser,
}

impl<'a, A: BotApi> ChatController<'a, A> {
    /// Load the sender's user record, creating it on first contact.
    pub fn new(api: &'a A, db: &'a Database, event: Incoming) -> Result<Self, BotError> {
        let (user, _) = db.get_or_create_user(event.sender.id)?;
        Ok(Self { api, db, event, user })
    }

    // ==================== ACCESSORS ====================

    pub fn chat_id(&self) -> i64 {
        self.event.sender.id
    }

    pub fn message_id(&self) -> Option<i64> {
        self.event.message_id
    }

    pub fn message_text(&self) -> Option<&str> {
        self.event.text()
    }

    pub fn callback_data(&self) -> Option<&str> {
        self.event.callback_data()
    }

    /// Callback payload, if it is one of ours.
    pub fn callback(&self) -> Option<CallbackData> {
        self.callback_data()?.parse().ok()
    }

    pub fn callback_query_id(&self) -> Option<&str> {
        self.event.callback_query_id()
    }

    pub fn event(&self) -> &Incoming {
        &self.event
    }

    pub fn user(&self) -> &BotUser {
        &self.user
    }

    pub fn step(&self) -> BotUserStep {
        self.user.step
    }

    pub fn messages(code: &str) -> Option<&'static str> {
        messages::messages(code)
    }

    // ==================== STATE ====================

    /// Copy the sender's first name and handle onto the stored user.
    pub fn sync_user(&mut self) -> Result<(), BotError> {
        let sender = &self.event.sender;
        self.db
            .update_user_profile(sender.id, Some(&sender.first_name), sender.username.as_deref())?;
        self.user.name = Some(sender.first_name.clone());
        self.user.username = sender.username.clone();
        Ok(())
    }

    pub fn set_step(&mut self, step: BotUserStep) -> Result<(), BotError> {
        self.db.set_user_step(self.chat_id(), step)?;
        self.user.step = step;
        Ok(())
    }

    /// The sender's draft vacancy, created on first use.
    pub fn vacancy(&self) -> Result<Vacancy, BotError> {
        let (vacancy, _) = self.db.get_or_create_vacancy(self.chat_id(), VacancyStatus::New)?;
        Ok(vacancy)
    }

    pub fn save_vacancy(&self, vacancy: &Vacancy) -> Result<(), BotError> {
        self.db.save_vacancy(vacancy)?;
        Ok(())
    }

    // ==================== TRANSPORT ====================

    fn render(&self, out: &Outgoing) -> Result<String, BotError> {
        let template = match &out.text {
            MessageText::Code(code) => {
                Self::messages(code).ok_or_else(|| BotError::UnknownMessageCode(code.clone()))?
            }
            MessageText::Raw(text) => text.as_str(),
        };

        if out.args.is_empty() {
            Ok(template.to_string())
        } else {
            Ok(format_positional(template, out.args.as_slice())?)
        }
    }

    pub async fn send_message(&self, out: Outgoing) -> Result<SentMessage, BotError> {
        let chat_id = out.chat_id.unwrap_or(self.chat_id());
        let text = self.render(&out)?;
        let reply_to = match out.reply_to {
            Some(id) => Some(id),
            None if out.as_reply => self.message_id(),
            None => None,
        };

        let message_id = self.api.send_message(chat_id, &text, out.markup, reply_to).await?;
        debug!("Sent message {} to chat {}", message_id, chat_id);
        Ok(SentMessage { chat_id, message_id, text })
    }

    pub async fn edit_message(&self, out: Outgoing) -> Result<SentMessage, BotError> {
        let chat_id = out.chat_id.unwrap_or(self.chat_id());
        let message_id = out.message_id.or(self.message_id()).ok_or(BotError::NoMessageId)?;
        let text = self.render(&out)?;
        let markup = match out.markup {
            None => None,
            Some(ReplyMarkup::InlineKeyboard(keyboard)) => Some(keyboard),
            Some(_) => return Err(BotError::NotInlineKeyboard),
        };

        self.api.edit_message_text(chat_id, message_id, &text, markup).await?;
        debug!("Edited message {} in chat {}", message_id, chat_id);
        Ok(SentMessage { chat_id, message_id, text })
    }

    pub async fn delete_message(&self, chat_id: Option<i64>, message_id: Option<i64>) -> Result<(), BotError> {
        let chat_id = chat_id.unwrap_or(self.chat_id());
        let message_id = message_id.or(self.message_id()).ok_or(BotError::NoMessageId)?;
        self.api.delete_message(chat_id, message_id).await
    }

    pub async fn answer_callback(&self, answer: CallbackAnswer) -> Result<(), BotError> {
        let query_id = match answer.query_id.as_deref() {
            Some(id) => id,
            None => self.callback_query_id().ok_or(BotError::NoCallbackQuery)?,
        };
        let text = match (answer.text.as_deref(), answer.code.as_deref()) {
            (Some(text), _) => Some(text),
            (None, Some(code)) => {
                Some(Self::messages(code).ok_or_else(|| BotError::UnknownMessageCode(code.to_string()))?)
            }
            (None, None) => None,
        };

        self.api.answer_callback_query(query_id, text, answer.show_alert).await
    }

    /// Download URL for a photo (or any file) the user sent.
    pub async fn create_photo_url(&self, file_id: &str) -> Result<String, BotError> {
        self.api.file_url(file_id).await
    }

    // ==================== KEYBOARDS ====================

    fn label(code: &str) -> String {
        Self::messages(code).unwrap_or(code).to_string()
    }

    pub fn main_menu_reply_button(&self) -> KeyboardButton {
        KeyboardButton::new(Self::label("main menu"))
    }

    pub fn main_menu_inline_button(&self) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(Self::label("main menu"), CallbackData::MainMenuButton.as_str())
    }

    pub fn back_reply_button(&self) -> KeyboardButton {
        KeyboardButton::new(Self::label("back_button"))
    }

    pub fn back_inline_button(&self) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(Self::label("back_button"), CallbackData::BackButton.as_str())
    }

    pub fn cancel_reply_button(&self) -> KeyboardButton {
        KeyboardButton::new(Self::label("cancel"))
    }

    pub fn cancel_inline_button(&self) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(Self::label("cancel"), CallbackData::CancelButton.as_str())
    }

    pub fn inline_markup(row_width: usize) -> InlineKeyboard {
        InlineKeyboard::new(row_width)
    }

    pub fn reply_markup(row_width: usize) -> ReplyKeyboard {
        ReplyKeyboard::new(row_width)
    }
}
