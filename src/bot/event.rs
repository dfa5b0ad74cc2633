//! Inbound events, reduced to what the controller reads.

use teloxide::types::{CallbackQuery, Message, User};

/// Who sent the event.
#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

impl From<&User> for Sender {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0 as i64,
            first_name: user.first_name.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A typed message.
    Message { text: Option<String> },
    /// An inline button press.
    Callback { id: String, data: Option<String> },
}

/// A message or callback from the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    pub sender: Sender,
    /// The message itself, or for callbacks the message the button was on.
    pub message_id: Option<i64>,
    pub kind: EventKind,
}

impl Incoming {
    /// `None` outside private chats and for messages without a user sender.
    pub fn from_message(msg: &Message) -> Option<Self> {
        if !msg.chat.is_private() {
            return None;
        }
        let user = msg.from.as_ref()?;
        Some(Self {
            sender: Sender::from(user),
            message_id: Some(msg.id.0 as i64),
            kind: EventKind::Message { text: msg.text().map(str::to_string) },
        })
    }

    /// `None` unless the button was on a message in a private chat.
    pub fn from_callback(query: &CallbackQuery) -> Option<Self> {
        let message = query.message.as_ref()?;
        if !message.chat().is_private() {
            return None;
        }
        Some(Self {
            sender: Sender::from(&query.from),
            message_id: Some(message.id().0 as i64),
            kind: EventKind::Callback {
                id: query.id.to_string(),
                data: query.data.clone(),
            },
        })
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Message { text } => text.as_deref(),
            EventKind::Callback { .. } => None,
        }
    }

    pub fn callback_query_id(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Callback { id, .. } => Some(id),
            EventKind::Message { .. } => None,
        }
    }

    pub fn callback_data(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Callback { data, .. } => data.as_deref(),
            EventKind::Message { .. } => None,
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self.kind, EventKind::Callback { .. })
    }
}
