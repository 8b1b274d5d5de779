//! Dela en enskild person mellan enheter som en liten JSON-fil

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::db::{Database, FollowUpRepository, PersonRepository, TagRepository};
use crate::models::{SharedPerson, SharedTag, SHARE_ID};
use crate::platform::{QueryInvalidator, QueryKey};
use crate::utils::path::{sanitize_filename, write_atomically};
use crate::utils::AppError;

pub struct PersonShareService<'a> {
    db: &'a Database,
}

impl<'a> PersonShareService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Bygg delningsinnehållet för en person
    pub fn build(&self, person_id: i64) -> Result<SharedPerson> {
        self.db.with_connection(|conn| {
            let data = PersonRepository::find_by_id_with(conn, person_id)?
                .ok_or_else(|| AppError::not_found(format!("Person med ID {}", person_id)))?;

            let tags = TagRepository::tag_names_for_person_with(conn, person_id)?
                .into_iter()
                .map(|tag_name| SharedTag { tag_name })
                .collect();

            Ok(SharedPerson {
                data,
                tags,
                follow_ups: FollowUpRepository::find_by_person_with(conn, person_id)?,
                share_id: SHARE_ID.to_string(),
            })
        })
    }

    /// Skriv `<namn>.json` i `dir` och returnera sökvägen
    pub fn write_share_file(&self, person_id: i64, dir: &Path) -> Result<PathBuf> {
        let shared = self.build(person_id)?;
        let json = serde_json::to_string_pretty(&shared).context("JSON serialisering misslyckades")?;

        let path = dir.join(format!("{}.json", sanitize_filename(&shared.data.name)));
        write_atomically(&path, json.as_bytes()).context("Kunde inte skriva delningsfil")?;

        info!("Delningsfil skapad för '{}' -> {:?}", shared.data.name, path);
        Ok(path)
    }

    /// Läs en delningsfil och lägg till personen som en ny post
    pub fn import_file(&self, path: &Path, invalidator: &dyn QueryInvalidator) -> Result<i64> {
        let content = std::fs::read(path)
            .map_err(|e| AppError::file_open(format!("{}: {}", path.display(), e)))?;
        let shared: SharedPerson = serde_json::from_slice(&content).map_err(AppError::from)?;

        if shared.share_id != SHARE_ID {
            return Err(AppError::InvalidFormat.into());
        }
        shared
            .data
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let name = shared.data.name.clone();
        let id = self.db.transaction(|tx| Self::insert(tx, &shared))?;

        invalidator.invalidate(QueryKey::Persons);
        invalidator.invalidate(QueryKey::Tags);

        info!("Importerade delad person '{}' (ID {})", name, id);
        Ok(id)
    }

    fn insert(conn: &Connection, shared: &SharedPerson) -> Result<i64> {
        let person_id = PersonRepository::insert_with(conn, &shared.data)?;

        for tag in &shared.tags {
            if let Some(tag_id) = TagRepository::find_or_create_with(conn, &tag.tag_name)? {
                TagRepository::link_with(conn, person_id, tag_id)?;
            }
        }
        for follow_up in &shared.follow_ups {
            FollowUpRepository::insert_with(conn, person_id, follow_up)?;
        }

        Ok(person_id)
    }
}
