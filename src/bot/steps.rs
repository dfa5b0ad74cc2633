//! Fixed enumerations: conversation steps, callback payloads, vacancy statuses.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// A string that doesn't name any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Conversation step stored on each user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BotUserStep {
    #[default]
    MainMenu,
    VacancyTitle,
    VacancyDescription,
    VacancySalary,
    VacancyContacts,
    VacancyPreview,
}

impl BotUserStep {
    pub const ALL: [BotUserStep; 6] = [
        Self::MainMenu,
        Self::VacancyTitle,
        Self::VacancyDescription,
        Self::VacancySalary,
        Self::VacancyContacts,
        Self::VacancyPreview,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MainMenu => "main_menu",
            Self::VacancyTitle => "vacancy_title",
            Self::VacancyDescription => "vacancy_description",
            Self::VacancySalary => "vacancy_salary",
            Self::VacancyContacts => "vacancy_contacts",
            Self::VacancyPreview => "vacancy_preview",
        }
    }

    /// Step the back button returns to.
    pub fn previous(self) -> Self {
        match self {
            Self::MainMenu | Self::VacancyTitle => Self::MainMenu,
            Self::VacancyDescription => Self::VacancyTitle,
            Self::VacancySalary => Self::VacancyDescription,
            Self::VacancyContacts => Self::VacancySalary,
            Self::VacancyPreview => Self::VacancyContacts,
        }
    }

    /// Step reached after the user answers this one.
    pub fn next(self) -> Self {
        match self {
            Self::MainMenu => Self::VacancyTitle,
            Self::VacancyTitle => Self::VacancyDescription,
            Self::VacancyDescription => Self::VacancySalary,
            Self::VacancySalary => Self::VacancyContacts,
            Self::VacancyContacts | Self::VacancyPreview => Self::VacancyPreview,
        }
    }

    /// Whether typed text is collected into the draft vacancy in this step.
    pub fn collects_text(self) -> bool {
        matches!(
            self,
            Self::VacancyTitle | Self::VacancyDescription | Self::VacancySalary | Self::VacancyContacts
        )
    }
}

impl fmt::Display for BotUserStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotUserStep {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "step", value: s.to_string() })
    }
}

impl ToSql for BotUserStep {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BotUserStep {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Payload carried by inline keyboard buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackData {
    MainMenuButton,
    BackButton,
    CancelButton,
    NewVacancy,
    PublishVacancy,
}

impl CallbackData {
    pub const ALL: [CallbackData; 5] = [
        Self::MainMenuButton,
        Self::BackButton,
        Self::CancelButton,
        Self::NewVacancy,
        Self::PublishVacancy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MainMenuButton => "main_menu_button",
            Self::BackButton => "back_button",
            Self::CancelButton => "cancel_button",
            Self::NewVacancy => "new_vacancy",
            Self::PublishVacancy => "publish_vacancy",
        }
    }
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallbackData {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|data| data.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "callback data", value: s.to_string() })
    }
}

/// Moderation lifecycle of a vacancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VacancyStatus {
    New,
    Moderation,
    Published,
    Rejected,
}

impl VacancyStatus {
    pub const ALL: [VacancyStatus; 4] = [Self::New, Self::Moderation, Self::Published, Self::Rejected];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Moderation => "moderation",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VacancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VacancyStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "vacancy status", value: s.to_string() })
    }
}

impl ToSql for VacancyStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for VacancyStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
