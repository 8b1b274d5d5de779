use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::models::SettingKey;

/// Typade beständiga flaggor och inställningar
pub struct SettingsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SettingsRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn get_string(&self, key: SettingKey) -> Result<Option<String>> {
        let conn = lock(&self.conn)?;
        let value = conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?",
                [key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_string(&self, key: SettingKey, value: &str) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT OR REPLACE INTO app_settings (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))",
            params![key.as_str(), value],
        )?;
        Ok(())
    }

    /// Saknade eller otolkbara värden räknas som `false`
    pub fn get_bool(&self, key: SettingKey) -> Result<bool> {
        Ok(self.get_string(key)?.as_deref() == Some("true"))
    }

    pub fn set_bool(&self, key: SettingKey, value: bool) -> Result<()> {
        self.set_string(key, if value { "true" } else { "false" })
    }

    pub fn get_i64(&self, key: SettingKey) -> Result<Option<i64>> {
        Ok(self.get_string(key)?.and_then(|v| v.parse().ok()))
    }

    pub fn set_i64(&self, key: SettingKey, value: i64) -> Result<()> {
        self.set_string(key, &value.to_string())
    }

    pub fn remove(&self, key: SettingKey) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute("DELETE FROM app_settings WHERE key = ?", [key.as_str()])?;
        Ok(())
    }

    pub fn date_migration_completed(&self) -> Result<bool> {
        self.get_bool(SettingKey::DateMigrationV1Completed)
    }

    pub fn mark_date_migration_completed(&self) -> Result<()> {
        self.set_bool(SettingKey::DateMigrationV1Completed, true)
    }

    pub fn language(&self) -> Result<String> {
        Ok(self
            .get_string(SettingKey::Language)?
            .unwrap_or_else(|| "sv".to_string()))
    }

    pub fn dark_map(&self) -> Result<bool> {
        self.get_bool(SettingKey::DarkMap)
    }
}
