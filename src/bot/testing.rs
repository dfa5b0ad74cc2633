//! In-memory `BotApi` that records every call.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use teloxide::types::{InlineKeyboardMarkup, ReplyMarkup};

use crate::bot::error::BotError;
use crate::bot::telegram::{BotApi, file_download_url};

pub const TEST_TOKEN: &str = "123:TEST";

#[derive(Debug, Clone)]
pub enum ApiCall {
    Send {
        chat_id: i64,
        text: String,
        markup: Option<ReplyMarkup>,
        reply_to: Option<i64>,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    },
    Delete {
        chat_id: i64,
        message_id: i64,
    },
    AnswerCallback {
        id: String,
        text: Option<String>,
        show_alert: bool,
    },
}

pub struct RecordingApi {
    calls: Mutex<Vec<ApiCall>>,
    next_message_id: AtomicI64,
    attempts: AtomicUsize,
    fail_at: AtomicUsize,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_message_id: AtomicI64::new(1000),
            attempts: AtomicUsize::new(0),
            fail_at: AtomicUsize::new(usize::MAX),
        }
    }

    /// Make the next call fail with a transport error.
    pub fn fail_next(&self) {
        self.fail_call(0);
    }

    /// Make the call `offset` positions after the next one fail (0 = next).
    pub fn fail_call(&self, offset: usize) {
        let next = self.attempts.load(Ordering::SeqCst);
        self.fail_at.store(next + offset, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<ApiCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Text of every sent or edited message, in order.
    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Send { text, .. } | ApiCall::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) -> Result<(), BotError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        let armed = self
            .fail_at
            .compare_exchange(attempt, usize::MAX, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if armed {
            return Err(BotError::Transport("Failed to send: connection reset".to_string()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl Default for RecordingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl BotApi for RecordingApi {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
        reply_to_message_id: Option<i64>,
    ) -> Result<i64, BotError> {
        self.record(ApiCall::Send {
            chat_id,
            text: text.to_string(),
            markup,
            reply_to: reply_to_message_id,
        })?;
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), BotError> {
        self.record(ApiCall::Edit { chat_id, message_id, text: text.to_string(), markup })
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), BotError> {
        self.record(ApiCall::Delete { chat_id, message_id })
    }

    async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), BotError> {
        self.record(ApiCall::AnswerCallback {
            id: callback_query_id.to_string(),
            text: text.map(str::to_string),
            show_alert,
        })
    }

    async fn file_url(&self, file_id: &str) -> Result<String, BotError> {
        Ok(file_download_url(TEST_TOKEN, &format!("photos/{file_id}.jpg")))
    }
}
