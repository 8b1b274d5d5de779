use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

use super::{from_db_timestamp, lock, to_db_timestamp};
use crate::models::FollowUp;
use crate::utils::AppError;

pub struct FollowUpRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FollowUpRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Hämta uppföljningar för en person, äldst först
    pub fn find_by_person(&self, person_id: i64) -> Result<Vec<FollowUp>> {
        let conn = lock(&self.conn)?;
        Self::find_by_person_with(&conn, person_id)
    }

    pub fn create(&self, follow_up: &mut FollowUp) -> Result<i64> {
        let conn = lock(&self.conn)?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM persons WHERE id = ?)",
            [follow_up.person_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(AppError::not_found(format!("Person med ID {}", follow_up.person_id)).into());
        }

        let id = Self::insert_with(&conn, follow_up.person_id, follow_up)?;
        follow_up.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, follow_up: &FollowUp) -> Result<()> {
        let id = follow_up.id.ok_or_else(|| anyhow!("Uppföljning har inget ID"))?;

        let conn = lock(&self.conn)?;
        let rows = conn.execute(
            "UPDATE follow_ups SET date = ?1, notes = ?2 WHERE id = ?3",
            params![to_db_timestamp(&follow_up.date), follow_up.notes, id],
        )?;

        if rows == 0 {
            return Err(AppError::not_found(format!("Uppföljning med ID {}", id)).into());
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = lock(&self.conn)?;
        let rows = conn.execute("DELETE FROM follow_ups WHERE id = ?", [id])?;

        if rows == 0 {
            return Err(AppError::not_found(format!("Uppföljning med ID {}", id)).into());
        }
        Ok(())
    }

    pub fn find_by_person_with(conn: &Connection, person_id: i64) -> Result<Vec<FollowUp>> {
        let mut stmt = conn.prepare(
            "SELECT id, person_id, date, notes FROM follow_ups
             WHERE person_id = ?
             ORDER BY date, id",
        )?;

        let items = stmt
            .query_map([person_id], Self::row_to_follow_up)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(items)
    }

    /// Infoga med given ägare; `follow_up.person_id` ignoreras
    pub fn insert_with(conn: &Connection, person_id: i64, follow_up: &FollowUp) -> Result<i64> {
        conn.execute(
            "INSERT INTO follow_ups (person_id, date, notes) VALUES (?1, ?2, ?3)",
            params![person_id, to_db_timestamp(&follow_up.date), follow_up.notes],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn row_to_follow_up(row: &Row) -> rusqlite::Result<FollowUp> {
        let date: String = row.get(2)?;
        Ok(FollowUp {
            id: Some(row.get(0)?),
            person_id: row.get(1)?,
            date: from_db_timestamp(&date).unwrap_or_else(Utc::now),
            notes: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Person;
    use chrono::TimeZone;

    #[test]
    fn test_crud() {
        let db = Database::open_in_memory().unwrap();
        let person_id = db.persons().create(&mut Person::new("Anna")).unwrap();
        let repo = db.follow_ups();

        let later = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        let mut a = FollowUp::new(person_id, later, "Andra besöket");
        let mut b = FollowUp::new(person_id, earlier, "Första besöket");
        repo.create(&mut a).unwrap();
        repo.create(&mut b).unwrap();

        let items = repo.find_by_person(person_id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].notes, "Första besöket");

        b.notes = "Ändrad".into();
        repo.update(&b).unwrap();
        repo.delete(a.id.unwrap()).unwrap();

        let items = repo.find_by_person(person_id).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].notes, "Ändrad");
    }

    #[test]
    fn test_create_requires_existing_person() {
        let db = Database::open_in_memory().unwrap();
        let mut orphan = FollowUp::new(42, Utc::now(), "Ingen ägare");
        let err = db.follow_ups().create(&mut orphan).unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::NotFound(_))));
    }
}
