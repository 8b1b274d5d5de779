//! Menyåtgärder: kopplar tjänsterna till plattformens dialoger och delning.
//!
//! Varje åtgärd fångar sina fel och visar en enda varning för användaren.
//! Returvärdet är `None` när åtgärden misslyckades. Spärrarna mot
//! överlappning ligger i `Database`, så två `MenuActions` över samma
//! databas spärrar varandra.

use std::path::{Path, PathBuf};

use tracing::error;

use crate::db::Database;
use crate::platform::{DocumentPicker, Notifier, QueryInvalidator, ShareSheet};
use crate::services::backup::{BackupResult, BackupService};
use crate::services::export::{ExportResult, ExportService};
use crate::services::guard::OperationGuard;
use crate::services::restore::{RestoreResult, RestoreService};
use crate::services::share::PersonShareService;
use crate::utils::AppError;

pub struct MenuActions<'a> {
    db: &'a Database,
    documents_dir: PathBuf,
    picker: &'a dyn DocumentPicker,
    share_sheet: &'a dyn ShareSheet,
    invalidator: &'a dyn QueryInvalidator,
    notifier: &'a dyn Notifier,
}

impl<'a> MenuActions<'a> {
    pub fn new(
        db: &'a Database,
        documents_dir: impl Into<PathBuf>,
        picker: &'a dyn DocumentPicker,
        share_sheet: &'a dyn ShareSheet,
        invalidator: &'a dyn QueryInvalidator,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            db,
            documents_dir: documents_dir.into(),
            picker,
            share_sheet,
            invalidator,
            notifier,
        }
    }

    /// Skriv backupfilen och lämna den till delningsfunktionen
    pub fn backup(&self) -> Option<BackupResult> {
        let result = self.guarded(&self.db.guards().backup, "Säkerhetskopiering misslyckades", || {
            BackupService::new(self.db).create_backup(&self.documents_dir)
        })?;

        self.notifier.notify(&format!(
            "Säkerhetskopia sparad ({}, {} personer)",
            result.size_display(),
            result.persons
        ));
        self.hand_over(&result.path, "Säkerhetskopiering");
        Some(result)
    }

    /// Välj en backupfil och ersätt innehållet i databasen
    pub fn restore(&self) -> Option<RestoreResult> {
        let result = self.guarded(&self.db.guards().restore, "Återställning misslyckades", || {
            RestoreService::new(self.db).restore_with_picker(self.picker, self.invalidator)
        })?;

        self.notifier.notify(&format!(
            "Återställning klar: {} personer och {} rapporter",
            result.persons, result.reports
        ));
        Some(result)
    }

    /// Skriv en delningsfil för en person
    pub fn share_person(&self, person_id: i64) -> Option<PathBuf> {
        let path = self.report("Kunde inte dela personen", || {
            PersonShareService::new(self.db).write_share_file(person_id, &self.documents_dir)
        })?;

        self.hand_over(&path, "Delning");
        Some(path)
    }

    /// Välj en delningsfil och lägg till personen
    pub fn import_person(&self) -> Option<i64> {
        let id = self.guarded(&self.db.guards().import, "Import misslyckades", || {
            let path = self
                .picker
                .pick_json()
                .ok_or_else(|| AppError::file_open("ingen fil vald"))?;
            PersonShareService::new(self.db).import_file(&path, self.invalidator)
        })?;

        self.notifier.notify("Personen har importerats");
        Some(id)
    }

    /// Exportera personlistan som Word-dokument
    pub fn export_docx(&self, include_follow_ups: bool) -> Option<ExportResult> {
        let result = self.report("Export misslyckades", || {
            ExportService::new(self.db).export_docx(&self.documents_dir, include_follow_ups)
        })?;

        self.notifier.notify(&result.summary());
        self.hand_over(&result.path, "Export");
        Some(result)
    }

    fn guarded<T>(
        &self,
        guard: &OperationGuard,
        title: &str,
        f: impl FnOnce() -> anyhow::Result<T>,
    ) -> Option<T> {
        let _token = match guard.try_acquire() {
            Ok(token) => token,
            Err(e) => {
                self.notifier.alert(title, &e.to_string());
                return None;
            }
        };
        self.report(title, f)
    }

    fn report<T>(&self, title: &str, f: impl FnOnce() -> anyhow::Result<T>) -> Option<T> {
        match f() {
            Ok(value) => Some(value),
            Err(e) => {
                error!("{}: {:#}", title, e);
                self.notifier.alert(title, &user_message(&e));
                None
            }
        }
    }

    fn hand_over(&self, path: &Path, what: &str) {
        if !self.share_sheet.is_available() {
            self.notifier
                .alert(what, &AppError::ShareUnavailable.to_string());
            return;
        }
        if let Err(e) = self.share_sheet.share(path) {
            error!("Delning av {:?} misslyckades: {:#}", path, e);
            self.notifier.alert(what, &user_message(&e));
        }
    }
}

/// Första kända felet i kedjan, annars hela kedjan
fn user_message(err: &anyhow::Error) -> String {
    err.chain()
        .find_map(|e| e.downcast_ref::<AppError>())
        .map(|e| e.to_string())
        .unwrap_or_else(|| format!("{:#}", err))
}
