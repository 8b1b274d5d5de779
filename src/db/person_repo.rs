use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

use super::{from_db_timestamp, lock, to_db_timestamp};
use crate::models::{InterestStatus, Person, VisitCategory};

const PERSON_COLUMNS: &str = "id, name, block, unit, street, contact, category, remarks, publications,
     date, initial_visit, latitude, longitude, is_private, status";

pub struct PersonRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PersonRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Hämta alla personer
    pub fn find_all(&self) -> Result<Vec<Person>> {
        let conn = lock(&self.conn)?;
        Self::find_all_with(&conn)
    }

    /// Hämta person via ID
    pub fn find_by_id(&self, id: i64) -> Result<Option<Person>> {
        let conn = lock(&self.conn)?;
        Self::find_by_id_with(&conn, id)
    }

    /// Sök på namn, gata eller anmärkningar
    pub fn search(&self, query: &str) -> Result<Vec<Person>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM persons
             WHERE name LIKE ?1 OR street LIKE ?1 OR remarks LIKE ?1
             ORDER BY name",
            PERSON_COLUMNS
        ))?;

        let pattern = format!("%{}%", query.trim());
        let persons = stmt
            .query_map([pattern], Self::row_to_person)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(persons)
    }

    /// Skapa ny person
    pub fn create(&self, person: &mut Person) -> Result<i64> {
        person.validate()?;

        let conn = lock(&self.conn)?;
        let id = Self::insert_with(&conn, person)?;
        person.id = Some(id);

        Ok(id)
    }

    /// Uppdatera person
    pub fn update(&self, person: &Person) -> Result<()> {
        let id = person.id.ok_or_else(|| anyhow!("Person har inget ID"))?;
        person.validate()?;

        let conn = lock(&self.conn)?;
        let rows = conn.execute(
            "UPDATE persons SET
                name = ?1, block = ?2, unit = ?3, street = ?4, contact = ?5,
                category = ?6, remarks = ?7, publications = ?8, date = ?9,
                initial_visit = ?10, latitude = ?11, longitude = ?12,
                is_private = ?13, status = ?14, updated_at = datetime('now')
             WHERE id = ?15",
            params![
                person.name,
                person.block,
                person.unit,
                person.street,
                person.contact,
                person.category.to_string(),
                person.remarks,
                person.publications,
                person.date,
                person.initial_visit.as_ref().map(to_db_timestamp),
                person.latitude,
                person.longitude,
                person.is_private,
                person.status.to_string(),
                id,
            ],
        )?;

        if rows == 0 {
            return Err(crate::utils::AppError::not_found(format!("Person med ID {}", id)).into());
        }

        Ok(())
    }

    /// Skriv om textdatumet (och fyll i första besöket om det saknas)
    pub fn update_legacy_date(&self, id: i64, date: &str, initial_visit: DateTime<Utc>) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "UPDATE persons SET
                date = ?1,
                initial_visit = COALESCE(initial_visit, ?2),
                updated_at = datetime('now')
             WHERE id = ?3",
            params![date, to_db_timestamp(&initial_visit), id],
        )?;
        Ok(())
    }

    /// Ta bort person tillsammans med uppföljningar och etikettkopplingar
    pub fn delete(&self, id: i64) -> Result<()> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM follow_ups WHERE person_id = ?", [id])?;
        tx.execute("DELETE FROM person_tags WHERE person_id = ?", [id])?;
        let rows = tx.execute("DELETE FROM persons WHERE id = ?", [id])?;

        if rows == 0 {
            return Err(crate::utils::AppError::not_found(format!("Person med ID {}", id)).into());
        }

        tx.commit()?;
        Ok(())
    }

    /// Räkna antal personer
    pub fn count(&self) -> Result<i64> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn find_all_with(conn: &Connection) -> Result<Vec<Person>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM persons ORDER BY id",
            PERSON_COLUMNS
        ))?;

        let persons = stmt
            .query_map([], Self::row_to_person)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(persons)
    }

    pub fn find_by_id_with(conn: &Connection, id: i64) -> Result<Option<Person>> {
        let person = conn
            .query_row(
                &format!("SELECT {} FROM persons WHERE id = ?", PERSON_COLUMNS),
                [id],
                Self::row_to_person,
            )
            .optional()?;

        Ok(person)
    }

    /// Infoga utan validering; `person.id` ignoreras
    pub fn insert_with(conn: &Connection, person: &Person) -> Result<i64> {
        conn.execute(
            "INSERT INTO persons (name, block, unit, street, contact, category, remarks,
                                  publications, date, initial_visit, latitude, longitude,
                                  is_private, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                person.name,
                person.block,
                person.unit,
                person.street,
                person.contact,
                person.category.to_string(),
                person.remarks,
                person.publications,
                person.date,
                person.initial_visit.as_ref().map(to_db_timestamp),
                person.latitude,
                person.longitude,
                person.is_private,
                person.status.to_string(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Töm persontabellen inklusive beroende rader
    pub fn delete_all_with(conn: &Connection) -> Result<usize> {
        conn.execute("DELETE FROM follow_ups", [])?;
        conn.execute("DELETE FROM person_tags", [])?;
        let rows = conn.execute("DELETE FROM persons", [])?;
        Ok(rows)
    }

    fn row_to_person(row: &Row) -> rusqlite::Result<Person> {
        Ok(Person {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            block: row.get(2)?,
            unit: row.get(3)?,
            street: row.get(4)?,
            contact: row.get(5)?,
            category: VisitCategory::from_db_str(&row.get::<_, String>(6)?),
            remarks: row.get(7)?,
            publications: row.get(8)?,
            date: row.get(9)?,
            initial_visit: row
                .get::<_, Option<String>>(10)?
                .as_deref()
                .and_then(from_db_timestamp),
            latitude: row.get(11)?,
            longitude: row.get(12)?,
            is_private: row.get(13)?,
            status: InterestStatus::from_db_str(&row.get::<_, String>(14)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::FollowUp;
    use crate::utils::AppError;
    use chrono::TimeZone;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_find() {
        let db = setup_db();
        let repo = db.persons();

        let mut person = Person {
            street: Some("Storgatan 1".into()),
            category: VisitCategory::BibleStudy,
            status: InterestStatus::Committed,
            latitude: Some(59.33),
            longitude: Some(18.06),
            is_private: true,
            initial_visit: Some(Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap()),
            ..Person::new("Anna")
        };

        let id = repo.create(&mut person).unwrap();
        assert!(id > 0);
        assert_eq!(person.id, Some(id));

        let found = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(found, person);
    }

    #[test]
    fn test_create_rejects_invalid() {
        let db = setup_db();
        assert!(db.persons().create(&mut Person::new("")).is_err());
        assert_eq!(db.persons().count().unwrap(), 0);
    }

    #[test]
    fn test_search() {
        let db = setup_db();
        let repo = db.persons();

        repo.create(&mut Person::new("Anna Svensson")).unwrap();
        repo.create(&mut Person::new("Erik Svensson")).unwrap();
        repo.create(&mut Person {
            street: Some("Ringvägen".into()),
            ..Person::new("Maria")
        })
        .unwrap();

        assert_eq!(repo.search("Svensson").unwrap().len(), 2);
        assert_eq!(repo.search("ringväg").unwrap().len(), 1);
    }

    #[test]
    fn test_update() {
        let db = setup_db();
        let repo = db.persons();

        let mut person = Person::new("Anna");
        repo.create(&mut person).unwrap();

        person.remarks = Some("Hemma efter 17".into());
        repo.update(&person).unwrap();

        let found = repo.find_by_id(person.id.unwrap()).unwrap().unwrap();
        assert_eq!(found.remarks.as_deref(), Some("Hemma efter 17"));

        let missing = Person {
            id: Some(999),
            ..Person::new("X")
        };
        let err = repo.update(&missing).unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::NotFound(_))));
    }

    #[test]
    fn test_delete_cascades_to_children() {
        let db = setup_db();
        let mut person = Person::new("Anna");
        let id = db.persons().create(&mut person).unwrap();

        let mut follow_up = FollowUp::new(id, Utc::now(), "Ring tillbaka");
        db.follow_ups().create(&mut follow_up).unwrap();
        let tag_id = db.tags().create("spanska").unwrap();
        db.tags().attach(id, tag_id).unwrap();

        db.persons().delete(id).unwrap();

        assert_eq!(db.persons().count().unwrap(), 0);
        assert!(db.follow_ups().find_by_person(id).unwrap().is_empty());
        assert_eq!(db.tags().usage_count(tag_id).unwrap(), 0);
        // Etiketten finns kvar, bara kopplingen försvann
        assert_eq!(db.tags().find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_update_legacy_date_keeps_existing_initial_visit() {
        let db = setup_db();
        let existing = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut person = Person {
            initial_visit: Some(existing),
            ..Person::new("Anna")
        };
        let id = db.persons().create(&mut person).unwrap();

        let new = Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap();
        db.persons()
            .update_legacy_date(id, "2025-03-03T00:00:00.000Z", new)
            .unwrap();

        let found = db.persons().find_by_id(id).unwrap().unwrap();
        assert_eq!(found.date.as_deref(), Some("2025-03-03T00:00:00.000Z"));
        assert_eq!(found.initial_visit, Some(existing));
    }
}
