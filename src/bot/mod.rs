//! Bot module - per-chat controller, storage and the vacancy conversation.

pub mod controller;
pub mod database;
pub mod error;
pub mod event;
pub mod format;
pub mod handlers;
pub mod keyboard;
pub mod messages;
pub mod steps;
pub mod telegram;

#[cfg(test)]
pub mod testing;

pub use controller::{CallbackAnswer, ChatController, Outgoing, SentMessage};
pub use database::{BotUser, Database, Vacancy};
pub use error::BotError;
pub use event::Incoming;
pub use messages::MessageCatalog;
pub use steps::{BotUserStep, CallbackData, VacancyStatus};
pub use telegram::{BotApi, TelegramClient};
