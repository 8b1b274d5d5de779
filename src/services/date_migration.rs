//! Engångsmigrering av gamla textdatum på personer
//!
//! Äldre versioner sparade besöksdatum som `dd/mm/åå`. Vid start skrivs de om
//! till kanoniska tidsstämplar. Flaggan i `app_settings` gör att det bara
//! sker en gång, även om enskilda rader inte gick att tolka.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::utils::date::{
    canonical_timestamp, is_canonical_timestamp, parse_slash_date, start_of_day_utc,
    DateConvention,
};

/// Utfall av en körning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub scanned: usize,
    pub migrated: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Flaggan var redan satt, inget lästes
    pub already_completed: bool,
}

pub struct DateMigrator<'a> {
    db: &'a Database,
}

impl<'a> DateMigrator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Kör migreringen om den inte redan gjorts.
    ///
    /// Fel på enskilda personer loggas och räknas men avbryter inte
    /// körningen. Bara fel mot själva databasen returneras.
    pub fn run(&self) -> Result<MigrationReport> {
        let settings = self.db.settings();
        if settings.date_migration_completed()? {
            debug!("Datummigrering redan genomförd");
            return Ok(MigrationReport {
                already_completed: true,
                ..Default::default()
            });
        }

        let persons = self.db.persons();
        let mut report = MigrationReport::default();

        for person in persons.find_all()? {
            report.scanned += 1;

            let (Some(id), Some(raw)) = (person.id, person.date.as_deref()) else {
                report.skipped += 1;
                continue;
            };
            let raw = raw.trim();
            if raw.is_empty() || is_canonical_timestamp(raw) {
                report.skipped += 1;
                continue;
            }

            match parse_slash_date(raw, DateConvention::Positional) {
                Ok(date) => {
                    let midnight = start_of_day_utc(date);
                    match persons.update_legacy_date(id, &canonical_timestamp(midnight), midnight) {
                        Ok(()) => report.migrated += 1,
                        Err(e) => {
                            warn!("Kunde inte spara migrerat datum för person {}: {}", id, e);
                            report.errors += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("Hoppar över datum för person {}: {}", id, e);
                    report.errors += 1;
                }
            }
        }

        settings.mark_date_migration_completed()?;

        info!(
            "Datummigrering klar: {} lästa, {} migrerade, {} överhoppade, {} fel",
            report.scanned, report.migrated, report.skipped, report.errors
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Person;
    use chrono::{TimeZone, Utc};

    fn person_with_date(db: &Database, name: &str, date: Option<&str>) -> i64 {
        let mut person = Person {
            date: date.map(String::from),
            ..Person::new(name)
        };
        db.persons().create(&mut person).unwrap()
    }

    #[test]
    fn test_migrates_legacy_dates() {
        let db = Database::open_in_memory().unwrap();
        let legacy = person_with_date(&db, "Anna", Some("03/03/25"));
        let canonical = person_with_date(&db, "Erik", Some("2024-01-02T10:00:00.000Z"));
        let invalid = person_with_date(&db, "Maria", Some("05/13/24"));
        let empty = person_with_date(&db, "Olle", None);

        let report = DateMigrator::new(&db).run().unwrap();
        assert_eq!(
            report,
            MigrationReport {
                scanned: 4,
                migrated: 1,
                skipped: 2,
                errors: 1,
                already_completed: false,
            }
        );

        let anna = db.persons().find_by_id(legacy).unwrap().unwrap();
        assert_eq!(anna.date.as_deref(), Some("2025-03-03T00:00:00.000Z"));
        assert_eq!(anna.initial_visit, Some(Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap()));

        let erik = db.persons().find_by_id(canonical).unwrap().unwrap();
        assert_eq!(erik.date.as_deref(), Some("2024-01-02T10:00:00.000Z"));
        assert_eq!(erik.initial_visit, None);

        let maria = db.persons().find_by_id(invalid).unwrap().unwrap();
        assert_eq!(maria.date.as_deref(), Some("05/13/24"));

        assert_eq!(db.persons().find_by_id(empty).unwrap().unwrap().date, None);
        assert!(db.settings().date_migration_completed().unwrap());
    }

    #[test]
    fn test_second_run_reads_nothing() {
        let db = Database::open_in_memory().unwrap();
        person_with_date(&db, "Anna", Some("13/05/24"));

        let first = DateMigrator::new(&db).run().unwrap();
        assert_eq!(first.migrated, 1);

        // Ny legacy-rad efter flaggan rörs inte
        let later = person_with_date(&db, "Erik", Some("01/02/23"));
        let second = DateMigrator::new(&db).run().unwrap();
        assert!(second.already_completed);
        assert_eq!(second.scanned, 0);

        let erik = db.persons().find_by_id(later).unwrap().unwrap();
        assert_eq!(erik.date.as_deref(), Some("01/02/23"));
    }

    #[test]
    fn test_keeps_existing_initial_visit() {
        let db = Database::open_in_memory().unwrap();
        let first_visit = Utc.with_ymd_and_hms(2020, 6, 1, 8, 0, 0).unwrap();
        let mut person = Person {
            date: Some("01/02/2023".into()),
            initial_visit: Some(first_visit),
            ..Person::new("Anna")
        };
        let id = db.persons().create(&mut person).unwrap();

        DateMigrator::new(&db).run().unwrap();

        let found = db.persons().find_by_id(id).unwrap().unwrap();
        assert_eq!(found.date.as_deref(), Some("2023-02-01T00:00:00.000Z"));
        assert_eq!(found.initial_visit, Some(first_visit));
    }

    #[test]
    fn test_flag_set_even_when_every_row_fails() {
        let db = Database::open_in_memory().unwrap();
        person_with_date(&db, "Anna", Some("inte/ett/datum"));

        let report = DateMigrator::new(&db).run().unwrap();
        assert_eq!(report.errors, 1);
        assert!(db.settings().date_migration_completed().unwrap());
    }
}
