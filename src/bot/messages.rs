//! Message catalog: text code → display string.
//!
//! Built-in strings can be overridden from a JSON object file. The catalog is
//! installed once at startup and is read-only afterwards.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::info;

static CATALOG: OnceLock<MessageCatalog> = OnceLock::new();

/// Built-in strings. Templates use positional `{}` / `{N}` fields.
const BUILTIN: &[(&str, &str)] = &[
    ("main menu", "🏠 Main menu"),
    ("back_button", "⬅️ Back"),
    ("cancel", "❌ Cancel"),
    ("new_vacancy_button", "📝 New vacancy"),
    ("publish_button", "✅ Send to moderation"),
    ("start", "Hello, <b>{}</b>! I will help you publish a vacancy."),
    ("main_menu_text", "Choose an action:"),
    ("ask_title", "Send the <b>job title</b>."),
    ("ask_description", "Describe the <b>duties and requirements</b>."),
    ("ask_salary", "What is the <b>salary</b>?"),
    ("ask_contacts", "How should candidates <b>contact</b> you?"),
    (
        "vacancy_preview",
        "<b>{0}</b>\n\n{1}\n\n💰 {2}\n📞 {3}\n\nSend this vacancy to moderation?",
    ),
    ("vacancy_sent", "Your vacancy was sent to moderation. Thank you!"),
    ("cancelled", "Cancelled."),
    ("unknown_command", "I didn't understand that. Use the buttons below."),
];

#[derive(Debug)]
pub enum CatalogError {
    ReadFile { path: PathBuf, source: std::io::Error },
    ParseJson { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read messages file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse messages file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageCatalog {
    entries: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(code, text)| (code.to_string(), text.to_string()))
            .collect();
        Self { entries }
    }

    /// Built-in strings with `overrides` layered on top.
    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        let mut catalog = Self::builtin();
        catalog.entries.extend(overrides);
        catalog
    }

    /// Load overrides from a JSON object of `"code": "text"` pairs.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| CatalogError::ReadFile { path: path.clone(), source: e })?;
        let overrides: HashMap<String, String> = serde_json::from_str(&content)
            .map_err(|e| CatalogError::ParseJson { path: path.clone(), source: e })?;
        info!("Loaded {} message overrides from {:?}", overrides.len(), path);
        Ok(Self::with_overrides(overrides))
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Install the process-wide catalog. Fails (returning it back) if one is
/// already installed or was already read.
pub fn install(catalog: MessageCatalog) -> Result<(), MessageCatalog> {
    CATALOG.set(catalog)
}

/// The process-wide catalog; the built-in one if nothing was installed.
pub fn catalog() -> &'static MessageCatalog {
    CATALOG.get_or_init(MessageCatalog::builtin)
}

/// Look up a code in the process-wide catalog.
pub fn messages(code: &str) -> Option<&'static str> {
    catalog().get(code)
}
