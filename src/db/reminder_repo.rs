use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

use super::{from_db_timestamp, lock, to_db_timestamp};
use crate::models::Reminder;
use crate::utils::AppError;

pub struct ReminderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReminderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Hämta alla påminnelser, nyaste först
    pub fn find_all(&self) -> Result<Vec<Reminder>> {
        let conn = lock(&self.conn)?;
        Self::find_all_with(&conn)
    }

    pub fn create(&self, reminder: &mut Reminder) -> Result<i64> {
        if reminder.note.trim().is_empty() {
            return Err(AppError::validation("Påminnelsen är tom").into());
        }

        let conn = lock(&self.conn)?;
        let id = Self::insert_with(&conn, reminder)?;
        reminder.id = Some(id);
        Ok(id)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = lock(&self.conn)?;
        let rows = conn.execute("DELETE FROM reminders WHERE id = ?", [id])?;

        if rows == 0 {
            return Err(AppError::not_found(format!("Påminnelse med ID {}", id)).into());
        }
        Ok(())
    }

    pub fn find_all_with(conn: &Connection) -> Result<Vec<Reminder>> {
        let mut stmt = conn.prepare(
            "SELECT id, note, created_at FROM reminders ORDER BY created_at DESC, id DESC",
        )?;

        let reminders = stmt
            .query_map([], Self::row_to_reminder)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(reminders)
    }

    pub fn insert_with(conn: &Connection, reminder: &Reminder) -> Result<i64> {
        conn.execute(
            "INSERT INTO reminders (note, created_at) VALUES (?1, ?2)",
            params![reminder.note, to_db_timestamp(&reminder.created_at)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn delete_all_with(conn: &Connection) -> Result<usize> {
        Ok(conn.execute("DELETE FROM reminders", [])?)
    }

    fn row_to_reminder(row: &Row) -> rusqlite::Result<Reminder> {
        let created_at: String = row.get(2)?;
        Ok(Reminder {
            id: Some(row.get(0)?),
            note: row.get(1)?,
            created_at: from_db_timestamp(&created_at).unwrap_or_else(Utc::now),
        })
    }
}
