pub mod schema;
pub mod migrations;
pub mod person_repo;
pub mod follow_up_repo;
pub mod tag_repo;
pub mod report_repo;
pub mod marker_repo;
pub mod reminder_repo;
pub mod settings_repo;

use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub use person_repo::PersonRepository;
pub use follow_up_repo::FollowUpRepository;
pub use tag_repo::TagRepository;
pub use report_repo::ReportRepository;
pub use marker_repo::MarkerRepository;
pub use reminder_repo::ReminderRepository;
pub use settings_repo::SettingsRepository;

use crate::services::guard::OperationGuards;

/// Huvuddatabas-wrapper med thread-safe access
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    guards: Arc<OperationGuards>,
}

impl Database {
    /// Öppna eller skapa databas
    pub fn open(path: &Path) -> Result<Self> {
        // Skapa katalog om den inte finns
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Konfigurera SQLite
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            "
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            guards: Arc::default(),
        })
    }

    /// Öppna in-memory databas (för tester)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            guards: Arc::default(),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Kör databasmigrationer
    pub fn migrate(&self) -> Result<()> {
        let conn = lock(&self.conn)?;
        migrations::run_migrations(&conn)
    }

    pub fn persons(&self) -> PersonRepository {
        PersonRepository::new(Arc::clone(&self.conn))
    }

    pub fn follow_ups(&self) -> FollowUpRepository {
        FollowUpRepository::new(Arc::clone(&self.conn))
    }

    pub fn tags(&self) -> TagRepository {
        TagRepository::new(Arc::clone(&self.conn))
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(Arc::clone(&self.conn))
    }

    pub fn markers(&self) -> MarkerRepository {
        MarkerRepository::new(Arc::clone(&self.conn))
    }

    pub fn reminders(&self) -> ReminderRepository {
        ReminderRepository::new(Arc::clone(&self.conn))
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(Arc::clone(&self.conn))
    }

    /// Spärrar för backup, återställning och import över alla kloner
    pub fn guards(&self) -> &OperationGuards {
        &self.guards
    }

    /// Direkt tillgång till connection (för avancerade operationer)
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = lock(&self.conn)?;
        f(&conn)
    }

    /// Kör `f` i en transaktion. Returnerar `f` ett fel rullas allt tillbaka.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            guards: Arc::clone(&self.guards),
        }
    }
}

pub(crate) fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| anyhow!("Databasanslutningen är låst efter en tidigare panik"))
}

/// Tidsstämplar lagras med fast bredd så att textjämförelse i SQL följer tiden
pub(crate) fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn from_db_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
