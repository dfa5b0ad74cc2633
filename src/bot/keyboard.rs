//! Keyboard builders that lay buttons out in rows of a fixed width.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

pub const DEFAULT_ROW_WIDTH: usize = 2;

fn chunk<T>(rows: &mut Vec<Vec<T>>, buttons: Vec<T>, row_width: usize) {
    let mut buttons = buttons.into_iter().peekable();
    while buttons.peek().is_some() {
        rows.push(buttons.by_ref().take(row_width).collect());
    }
}

/// Inline keyboard under a message.
#[derive(Debug, Clone)]
pub struct InlineKeyboard {
    row_width: usize,
    rows: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboard {
    /// A zero width is treated as one button per row.
    pub fn new(row_width: usize) -> Self {
        Self { row_width: row_width.max(1), rows: Vec::new() }
    }

    /// Append buttons, wrapping every `row_width` buttons.
    pub fn add(mut self, buttons: impl IntoIterator<Item = InlineKeyboardButton>) -> Self {
        chunk(&mut self.rows, buttons.into_iter().collect(), self.row_width);
        self
    }

    /// Append buttons as a single row regardless of width.
    pub fn row(mut self, buttons: impl IntoIterator<Item = InlineKeyboardButton>) -> Self {
        let row: Vec<_> = buttons.into_iter().collect();
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    pub fn build(self) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(self.rows)
    }
}

impl Default for InlineKeyboard {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_WIDTH)
    }
}

/// One-time, resized reply keyboard.
#[derive(Debug, Clone)]
pub struct ReplyKeyboard {
    row_width: usize,
    rows: Vec<Vec<KeyboardButton>>,
}

impl ReplyKeyboard {
    pub fn new(row_width: usize) -> Self {
        Self { row_width: row_width.max(1), rows: Vec::new() }
    }

    pub fn add(mut self, buttons: impl IntoIterator<Item = KeyboardButton>) -> Self {
        chunk(&mut self.rows, buttons.into_iter().collect(), self.row_width);
        self
    }

    pub fn row(mut self, buttons: impl IntoIterator<Item = KeyboardButton>) -> Self {
        let row: Vec<_> = buttons.into_iter().collect();
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    pub fn build(self) -> KeyboardMarkup {
        KeyboardMarkup::new(self.rows).resize_keyboard().one_time_keyboard()
    }
}

impl Default for ReplyKeyboard {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_WIDTH)
    }
}
