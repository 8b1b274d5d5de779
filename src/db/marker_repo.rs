use anyhow::Result;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::models::MarkerAnnotation;
use crate::utils::AppError;

pub struct MarkerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MarkerRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn find_all(&self) -> Result<Vec<MarkerAnnotation>> {
        let conn = lock(&self.conn)?;
        Self::find_all_with(&conn)
    }

    pub fn create(&self, marker: &mut MarkerAnnotation) -> Result<i64> {
        if !(-90.0..=90.0).contains(&marker.latitude) || !(-180.0..=180.0).contains(&marker.longitude) {
            return Err(AppError::validation("Koordinaterna ligger utanför giltigt intervall").into());
        }

        let conn = lock(&self.conn)?;
        let id = Self::insert_with(&conn, marker)?;
        marker.id = Some(id);
        Ok(id)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = lock(&self.conn)?;
        let rows = conn.execute("DELETE FROM marker_annotations WHERE id = ?", [id])?;

        if rows == 0 {
            return Err(AppError::not_found(format!("Kartanteckning med ID {}", id)).into());
        }
        Ok(())
    }

    pub fn find_all_with(conn: &Connection) -> Result<Vec<MarkerAnnotation>> {
        let mut stmt = conn.prepare(
            "SELECT id, latitude, longitude, text FROM marker_annotations ORDER BY id",
        )?;

        let markers = stmt
            .query_map([], Self::row_to_marker)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(markers)
    }

    pub fn insert_with(conn: &Connection, marker: &MarkerAnnotation) -> Result<i64> {
        conn.execute(
            "INSERT INTO marker_annotations (latitude, longitude, text) VALUES (?1, ?2, ?3)",
            params![marker.latitude, marker.longitude, marker.text],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn delete_all_with(conn: &Connection) -> Result<usize> {
        Ok(conn.execute("DELETE FROM marker_annotations", [])?)
    }

    fn row_to_marker(row: &Row) -> rusqlite::Result<MarkerAnnotation> {
        Ok(MarkerAnnotation {
            id: Some(row.get(0)?),
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            text: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_create_list_delete() {
        let db = Database::open_in_memory().unwrap();
        let repo = db.markers();

        let mut marker = MarkerAnnotation::new(59.33, 18.06, "Portkod 1234");
        let id = repo.create(&mut marker).unwrap();

        assert_eq!(repo.find_all().unwrap(), vec![marker]);

        repo.delete(id).unwrap();
        assert!(repo.find_all().unwrap().is_empty());
        assert!(repo.delete(id).is_err());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let db = Database::open_in_memory().unwrap();
        let mut marker = MarkerAnnotation::new(120.0, 18.0, "Fel");
        assert!(db.markers().create(&mut marker).is_err());
    }
}
