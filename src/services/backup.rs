//! Backup-service: exporterar hela databasen till ett JSON-kuvert

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::db::{
    Database, FollowUpRepository, MarkerRepository, PersonRepository, ReminderRepository,
    ReportRepository, TagRepository,
};
use crate::models::{BackupEnvelope, PersonBackup, BACKUP_FILENAME, BACKUP_ID};
use crate::utils::path::write_atomically;

/// Resultat av en backup-operation
#[derive(Debug, Clone)]
pub struct BackupResult {
    /// Sökväg till backup-filen
    pub path: PathBuf,
    /// Storlek i bytes
    pub size: u64,
    pub persons: usize,
    pub reports: usize,
    pub markers: usize,
    pub reminders: usize,
    pub created_at: DateTime<Utc>,
}

impl BackupResult {
    /// Formatera storlek för visning
    pub fn size_display(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;

        match self.size {
            b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
            b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
            b => format!("{} B", b),
        }
    }
}

/// Backup-service
pub struct BackupService<'a> {
    db: &'a Database,
}

impl<'a> BackupService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Sökväg till backupfilen i en dokumentkatalog
    pub fn backup_path(documents_dir: &Path) -> PathBuf {
        documents_dir.join(BACKUP_FILENAME)
    }

    /// Läs alla tabeller och bygg kuvertet utan databas-ID:n
    pub fn build_envelope(&self) -> Result<BackupEnvelope> {
        self.db.with_connection(|conn| {
            let mut person = Vec::new();
            for p in PersonRepository::find_all_with(conn)? {
                let id = p.id.context("Person utan ID i databasen")?;
                person.push(PersonBackup {
                    tags: TagRepository::tag_names_for_person_with(conn, id)?,
                    follow_ups: FollowUpRepository::find_by_person_with(conn, id)?,
                    person: p,
                });
            }

            Ok(BackupEnvelope {
                person,
                report: ReportRepository::find_all_with(conn)?,
                marker_annotation: MarkerRepository::find_all_with(conn)?,
                reminders: ReminderRepository::find_all_with(conn)?,
                backup_date: Utc::now(),
                backup_id: BACKUP_ID.to_string(),
            })
        })
    }

    /// Skapa en backup i `documents_dir`, skriver över en tidigare
    pub fn create_backup(&self, documents_dir: &Path) -> Result<BackupResult> {
        let envelope = self.build_envelope()?;
        let json = serde_json::to_string_pretty(&envelope)
            .context("JSON serialisering misslyckades")?;

        let path = Self::backup_path(documents_dir);
        write_atomically(&path, json.as_bytes()).context("Kunde inte skriva backup-fil")?;

        info!(
            "Backup skapad: {} personer, {} rapporter -> {:?}",
            envelope.person.len(),
            envelope.report.len(),
            path
        );

        Ok(BackupResult {
            path,
            size: json.len() as u64,
            persons: envelope.person.len(),
            reports: envelope.report.len(),
            markers: envelope.marker_annotation.len(),
            reminders: envelope.reminders.len(),
            created_at: envelope.backup_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FollowUp, MarkerAnnotation, Person, Reminder, Report};
    use chrono::TimeZone;

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();

        let mut anna = Person::new("Anna");
        let anna_id = db.persons().create(&mut anna).unwrap();
        let spanska = db.tags().create("spanska").unwrap();
        let aldre = db.tags().create("äldre").unwrap();
        db.tags().attach(anna_id, aldre).unwrap();
        db.tags().attach(anna_id, spanska).unwrap();
        let date = Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap();
        db.follow_ups()
            .create(&mut FollowUp::new(anna_id, date, "Lämnade broschyr"))
            .unwrap();

        db.persons().create(&mut Person::new("Erik")).unwrap();
        db.reports().create(&mut Report::new(date, 2.0)).unwrap();
        db.markers()
            .create(&mut MarkerAnnotation::new(59.3, 18.0, "Hund"))
            .unwrap();
        db.reminders().create(&mut Reminder::new("Ring Erik")).unwrap();

        db
    }

    #[test]
    fn test_envelope_has_no_ids_and_embeds_relations() {
        let db = seeded_db();
        let envelope = BackupService::new(&db).build_envelope().unwrap();
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["backupID"], "fspalbackup");
        assert!(json.get("backupDate").is_some());

        let anna = &json["person"][0];
        assert!(anna.get("id").is_none());
        assert_eq!(anna["tags"], serde_json::json!(["äldre", "spanska"]));
        let follow_up = anna["followUps"][0].as_object().unwrap();
        assert_eq!(follow_up.len(), 2);
        assert_eq!(follow_up["notes"], "Lämnade broschyr");

        assert!(json["person"][1]["tags"].as_array().unwrap().is_empty());

        for key in ["report", "markerAnnotation", "reminders"] {
            let items = json[key].as_array().unwrap();
            assert_eq!(items.len(), 1, "{}", key);
            assert!(items[0].get("id").is_none(), "{}", key);
        }
    }

    #[test]
    fn test_create_backup_writes_fixed_file() {
        let db = seeded_db();
        let dir = tempfile::tempdir().unwrap();

        std::fs::write(dir.path().join(BACKUP_FILENAME), "gammal").unwrap();

        let result = BackupService::new(&db).create_backup(dir.path()).unwrap();
        assert_eq!(result.path, dir.path().join("fspal_backup.json"));
        assert_eq!(result.persons, 2);
        assert_eq!(result.reports, 1);

        let content = std::fs::read_to_string(&result.path).unwrap();
        assert!(content.contains("\n  \"person\""));
        assert_eq!(content.len() as u64, result.size);

        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["backupID"], BACKUP_ID);

        // Exporten ändrar inte databasen
        assert_eq!(db.persons().count().unwrap(), 2);
    }
}
