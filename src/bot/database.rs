//! Persistent SQLite storage for bot users and their vacancies.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::bot::steps::{BotUserStep, VacancyStatus};

/// A person talking to the bot, keyed by their chat id.
#[derive(Debug, Clone, PartialEq)]
pub struct BotUser {
    pub chat_id: i64,
    pub name: Option<String>,
    pub username: Option<String>,
    pub step: BotUserStep,
    pub created_at: String,
}

impl BotUser {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            chat_id: row.get(0)?,
            name: row.get(1)?,
            username: row.get(2)?,
            step: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

/// A vacancy draft or submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Vacancy {
    pub id: i64,
    pub user_chat_id: i64,
    pub status: VacancyStatus,
    pub title: Option<String>,
    pub description: Option<String>,
    pub salary: Option<String>,
    pub contacts: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Vacancy {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_chat_id: row.get(1)?,
            status: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            salary: row.get(5)?,
            contacts: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

const USER_COLUMNS: &str = "chat_id, name, username, step, created_at";
const VACANCY_COLUMNS: &str =
    "id, user_chat_id, status, title, description, salary, contacts, created_at, updated_at";

fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// SQLite-backed repository. Each method takes the connection lock once, so
/// get-or-create runs its lookup and insert without interleaving.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Create a new in-memory database.
    pub fn in_memory() -> rusqlite::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open (or create) a database file.
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let db = Self::init(Connection::open(path)?)?;
        let (users, vacancies) = db.counts()?;
        info!("Loaded database from {:?} ({} users, {} vacancies)", path, users, vacancies);
        Ok(db)
    }

    fn init(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                chat_id INTEGER PRIMARY KEY,
                name TEXT,
                username TEXT,
                step TEXT NOT NULL DEFAULT 'main_menu',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS vacancies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_chat_id INTEGER NOT NULL REFERENCES users(chat_id),
                status TEXT NOT NULL,
                title TEXT,
                description TEXT,
                salary TEXT,
                contacts TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_vacancies_user_status ON vacancies(user_chat_id, status);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_vacancies_one_new
                ON vacancies(user_chat_id) WHERE status = 'new';
        "#,
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn counts(&self) -> rusqlite::Result<(usize, usize)> {
        let conn = self.conn();
        let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let vacancies: i64 = conn.query_row("SELECT COUNT(*) FROM vacancies", [], |row| row.get(0))?;
        Ok((users as usize, vacancies as usize))
    }

    // ==================== USER METHODS ====================

    /// Fetch the user for `chat_id`, inserting a fresh one if missing.
    /// Returns the user and whether it was created by this call.
    pub fn get_or_create_user(&self, chat_id: i64) -> rusqlite::Result<(BotUser, bool)> {
        let conn = self.conn();
        let created = conn.execute(
            "INSERT INTO users (chat_id, step, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(chat_id) DO NOTHING",
            params![chat_id, BotUserStep::default(), now()],
        )? > 0;

        let user = conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE chat_id = ?1"),
            params![chat_id],
            BotUser::from_row,
        )?;

        if created {
            info!("👤 New user {}", chat_id);
        }
        Ok((user, created))
    }

    pub fn find_user(&self, chat_id: i64) -> rusqlite::Result<Option<BotUser>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE chat_id = ?1"),
                params![chat_id],
                BotUser::from_row,
            )
            .optional()
    }

    /// Store the sender's current first name and handle.
    pub fn update_user_profile(
        &self,
        chat_id: i64,
        name: Option<&str>,
        username: Option<&str>,
    ) -> rusqlite::Result<()> {
        self.conn().execute(
            "UPDATE users SET name = ?2, username = ?3 WHERE chat_id = ?1",
            params![chat_id, name, username],
        )?;
        Ok(())
    }

    pub fn set_user_step(&self, chat_id: i64, step: BotUserStep) -> rusqlite::Result<()> {
        self.conn().execute(
            "UPDATE users SET step = ?2 WHERE chat_id = ?1",
            params![chat_id, step],
        )?;
        debug!("User {} → step {}", chat_id, step);
        Ok(())
    }

    pub fn user_count(&self) -> rusqlite::Result<usize> {
        self.counts().map(|(users, _)| users)
    }

    // ==================== VACANCY METHODS ====================

    /// Fetch the oldest vacancy of `user_chat_id` with `status`, inserting an
    /// empty one if there is none.
    pub fn get_or_create_vacancy(
        &self,
        user_chat_id: i64,
        status: VacancyStatus,
    ) -> rusqlite::Result<(Vacancy, bool)> {
        let conn = self.conn();
        let select = format!(
            "SELECT {VACANCY_COLUMNS} FROM vacancies WHERE user_chat_id = ?1 AND status = ?2
             ORDER BY id LIMIT 1"
        );

        if let Some(vacancy) = conn
            .query_row(&select, params![user_chat_id, status], Vacancy::from_row)
            .optional()?
        {
            return Ok((vacancy, false));
        }

        let ts = now();
        conn.execute(
            "INSERT OR IGNORE INTO vacancies (user_chat_id, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![user_chat_id, status, ts],
        )?;
        let vacancy = conn.query_row(&select, params![user_chat_id, status], Vacancy::from_row)?;
        info!("📝 New vacancy {} for user {}", vacancy.id, user_chat_id);
        Ok((vacancy, true))
    }

    /// Write back every mutable field of `vacancy`.
    pub fn save_vacancy(&self, vacancy: &Vacancy) -> rusqlite::Result<()> {
        self.conn().execute(
            "UPDATE vacancies SET status = ?2, title = ?3, description = ?4, salary = ?5,
                contacts = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                vacancy.id,
                vacancy.status,
                vacancy.title,
                vacancy.description,
                vacancy.salary,
                vacancy.contacts,
                now()
            ],
        )?;
        Ok(())
    }

    pub fn vacancies_for_user(&self, user_chat_id: i64) -> rusqlite::Result<Vec<Vacancy>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {VACANCY_COLUMNS} FROM vacancies WHERE user_chat_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![user_chat_id], Vacancy::from_row)?;
        rows.collect()
    }
}
