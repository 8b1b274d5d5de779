use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::models::Tag;
use crate::utils::AppError;

pub struct TagRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TagRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Hämta alla etiketter i bokstavsordning
    pub fn find_all(&self) -> Result<Vec<Tag>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name")?;

        let tags = stmt
            .query_map([], Self::row_to_tag)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(tags)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let conn = lock(&self.conn)?;
        let tag = conn
            .query_row(
                "SELECT id, name FROM tags WHERE name = ?",
                [Tag::normalize_name(name)],
                Self::row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    /// Skapa ny etikett; namnet normaliseras och måste vara unikt
    pub fn create(&self, name: &str) -> Result<i64> {
        let normalized = Self::validated_name(name)?;

        let conn = lock(&self.conn)?;
        if Self::find_id_with(&conn, &normalized)?.is_some() {
            return Err(AppError::already_exists(format!("Etiketten '{}'", normalized)).into());
        }

        conn.execute("INSERT INTO tags (name) VALUES (?)", [&normalized])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn rename(&self, id: i64, new_name: &str) -> Result<()> {
        let normalized = Self::validated_name(new_name)?;

        let conn = lock(&self.conn)?;
        if let Some(existing) = Self::find_id_with(&conn, &normalized)? {
            if existing != id {
                return Err(AppError::already_exists(format!("Etiketten '{}'", normalized)).into());
            }
        }

        let rows = conn.execute("UPDATE tags SET name = ? WHERE id = ?", params![normalized, id])?;
        if rows == 0 {
            return Err(AppError::not_found(format!("Etikett med ID {}", id)).into());
        }
        Ok(())
    }

    /// Ta bort en etikett. Vägras så länge någon person använder den.
    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = lock(&self.conn)?;

        let name: Option<String> = conn
            .query_row("SELECT name FROM tags WHERE id = ?", [id], |row| row.get(0))
            .optional()?;
        let name = name.ok_or_else(|| AppError::not_found(format!("Etikett med ID {}", id)))?;

        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM person_tags WHERE tag_id = ?",
            [id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Err(AppError::TagInUse(name).into());
        }

        conn.execute("DELETE FROM tags WHERE id = ?", [id])?;
        Ok(())
    }

    /// Koppla etikett till person (ingen effekt om kopplingen redan finns)
    pub fn attach(&self, person_id: i64, tag_id: i64) -> Result<()> {
        let conn = lock(&self.conn)?;
        Self::link_with(&conn, person_id, tag_id)
    }

    pub fn detach(&self, person_id: i64, tag_id: i64) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "DELETE FROM person_tags WHERE person_id = ? AND tag_id = ?",
            params![person_id, tag_id],
        )?;
        Ok(())
    }

    /// Etiketter för en person i kopplingsordning
    pub fn tags_for_person(&self, person_id: i64) -> Result<Vec<Tag>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name FROM tags t
             INNER JOIN person_tags pt ON pt.tag_id = t.id
             WHERE pt.person_id = ?
             ORDER BY pt.id",
        )?;

        let tags = stmt
            .query_map([person_id], Self::row_to_tag)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(tags)
    }

    /// Antal personer som använder etiketten
    pub fn usage_count(&self, tag_id: i64) -> Result<i64> {
        let conn = lock(&self.conn)?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM person_tags WHERE tag_id = ?",
            [tag_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Namn på personens etiketter i kopplingsordning
    pub fn tag_names_for_person_with(conn: &Connection, person_id: i64) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT t.name FROM tags t
             INNER JOIN person_tags pt ON pt.tag_id = t.id
             WHERE pt.person_id = ?
             ORDER BY pt.id",
        )?;

        let names = stmt
            .query_map([person_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(names)
    }

    /// Hitta etikett på namn eller skapa den. Tomma namn ger `None`.
    pub fn find_or_create_with(conn: &Connection, name: &str) -> Result<Option<i64>> {
        let normalized = Tag::normalize_name(name);
        if normalized.is_empty() {
            return Ok(None);
        }

        if let Some(id) = Self::find_id_with(conn, &normalized)? {
            return Ok(Some(id));
        }

        conn.execute("INSERT INTO tags (name) VALUES (?)", [&normalized])?;
        Ok(Some(conn.last_insert_rowid()))
    }

    pub fn link_with(conn: &Connection, person_id: i64, tag_id: i64) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO person_tags (person_id, tag_id) VALUES (?, ?)",
            params![person_id, tag_id],
        )?;
        Ok(())
    }

    fn find_id_with(conn: &Connection, normalized: &str) -> Result<Option<i64>> {
        let id = conn
            .query_row("SELECT id FROM tags WHERE name = ?", [normalized], |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    fn validated_name(name: &str) -> Result<String> {
        let normalized = Tag::normalize_name(name);
        if normalized.is_empty() {
            return Err(AppError::validation("Etikettnamn får inte vara tomt").into());
        }
        Ok(normalized)
    }

    fn row_to_tag(row: &Row) -> rusqlite::Result<Tag> {
        Ok(Tag {
            id: Some(row.get(0)?),
            name: row.get(1)?,
        })
    }
}
