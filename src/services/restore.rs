//! Restore-service för att återställa från en JSON-backup

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{
    Database, FollowUpRepository, MarkerRepository, PersonRepository, ReminderRepository,
    ReportRepository, TagRepository,
};
use crate::models::{IncomingBackup, PersonBackup, BACKUP_ID};
use crate::platform::{DocumentPicker, QueryInvalidator, QueryKey};
use crate::utils::AppError;

/// Resultat av en restore-operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreResult {
    pub persons: usize,
    pub reports: usize,
    pub tag_links: usize,
    pub follow_ups: usize,
    /// `None` om backupen saknade fältet och tabellen lämnades orörd
    pub markers: Option<usize>,
    pub reminders: Option<usize>,
}

/// Förhandsgranskning av en backupfil
#[derive(Debug, Clone)]
pub struct RestorePreview {
    pub backup_date: Option<String>,
    pub persons: usize,
    pub reports: usize,
    pub has_markers: bool,
    pub has_reminders: bool,
}

/// Restore-service
pub struct RestoreService<'a> {
    db: &'a Database,
}

impl<'a> RestoreService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Läs och validera en backupfil utan att röra databasen
    pub fn read_backup(path: &Path) -> Result<IncomingBackup> {
        let content = std::fs::read(path)
            .map_err(|e| AppError::file_open(format!("{}: {}", path.display(), e)))?;

        // Felaktig teckenkodning är ett JSON-fel, inte ett fel vid öppning
        let value: serde_json::Value =
            serde_json::from_slice(&content).map_err(AppError::from)?;

        // Fingeravtrycket kontrolleras innan resten av strukturen tolkas
        if value.get("backupID").and_then(|v| v.as_str()) != Some(BACKUP_ID) {
            return Err(AppError::InvalidFormat.into());
        }

        let backup: IncomingBackup = serde_json::from_value(value).map_err(AppError::from)?;
        Ok(backup)
    }

    /// Förhandsgranska en backup
    pub fn preview(path: &Path) -> Result<RestorePreview> {
        let backup = Self::read_backup(path)?;
        Ok(RestorePreview {
            backup_date: backup.backup_date,
            persons: backup.person.len(),
            reports: backup.report.len(),
            has_markers: backup.marker_annotation.is_some(),
            has_reminders: backup.reminders.is_some(),
        })
    }

    /// Låt användaren välja fil och återställ från den
    pub fn restore_with_picker(
        &self,
        picker: &dyn DocumentPicker,
        invalidator: &dyn QueryInvalidator,
    ) -> Result<RestoreResult> {
        let path = picker
            .pick_json()
            .ok_or_else(|| AppError::file_open("ingen fil vald"))?;
        self.restore_file(&path, invalidator)
    }

    /// Ersätt personer och rapporter med innehållet i `path`.
    ///
    /// Allt sker i en transaktion: misslyckas något finns det gamla kvar.
    pub fn restore_file(&self, path: &Path, invalidator: &dyn QueryInvalidator) -> Result<RestoreResult> {
        let backup = Self::read_backup(path)?;
        let result = self
            .db
            .transaction(|tx| Self::apply(tx, backup))
            .context("Återställningen avbröts, inga ändringar gjordes")?;

        invalidator.invalidate(QueryKey::Persons);
        invalidator.invalidate(QueryKey::Reports);
        invalidator.invalidate(QueryKey::Tags);
        if result.markers.is_some() {
            invalidator.invalidate(QueryKey::Markers);
        }
        if result.reminders.is_some() {
            invalidator.invalidate(QueryKey::Reminders);
        }

        info!(
            "Återställde {} personer och {} rapporter från {:?}",
            result.persons, result.reports, path
        );
        Ok(result)
    }

    fn apply(conn: &Connection, backup: IncomingBackup) -> Result<RestoreResult> {
        let mut result = RestoreResult::default();

        PersonRepository::delete_all_with(conn)?;
        ReportRepository::delete_all_with(conn)?;

        for entry in backup.person {
            Self::insert_person(conn, entry, &mut result)?;
        }

        let now = Utc::now();
        for record in backup.report {
            ReportRepository::insert_with(conn, &record.into_report(now))?;
            result.reports += 1;
        }

        if let Some(markers) = backup.marker_annotation {
            MarkerRepository::delete_all_with(conn)?;
            for marker in &markers {
                MarkerRepository::insert_with(conn, marker)?;
            }
            result.markers = Some(markers.len());
        }

        if let Some(reminders) = backup.reminders {
            ReminderRepository::delete_all_with(conn)?;
            for reminder in &reminders {
                ReminderRepository::insert_with(conn, reminder)?;
            }
            result.reminders = Some(reminders.len());
        }

        Ok(result)
    }

    fn insert_person(conn: &Connection, entry: PersonBackup, result: &mut RestoreResult) -> Result<()> {
        if let Err(e) = entry.person.validate() {
            warn!("Person '{}' i backupen är ofullständig: {}", entry.person.name, e);
        }

        let person_id = PersonRepository::insert_with(conn, &entry.person)?;
        result.persons += 1;

        for name in &entry.tags {
            if let Some(tag_id) = TagRepository::find_or_create_with(conn, name)? {
                TagRepository::link_with(conn, person_id, tag_id)?;
                result.tag_links += 1;
            }
        }

        for follow_up in &entry.follow_ups {
            FollowUpRepository::insert_with(conn, person_id, follow_up)?;
            result.follow_ups += 1;
        }

        Ok(())
    }
}
