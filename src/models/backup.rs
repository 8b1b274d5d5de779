//! Utbytesformat för backup och delning av enskilda personer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::date::parse_timestamp;

use super::{FollowUp, MarkerAnnotation, Person, Reminder, Report, ReportType, SharedTag};

/// Fingeravtryck som identifierar en backupfil
pub const BACKUP_ID: &str = "fspalbackup";

/// Fast filnamn för backupen i dokumentkatalogen
pub const BACKUP_FILENAME: &str = "fspal_backup.json";

/// Fingeravtryck som identifierar en delad person
pub const SHARE_ID: &str = "fsPalShare";

/// Person med etiketter och uppföljningar inbäddade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonBackup {
    #[serde(flatten)]
    pub person: Person,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,
}

/// Backupfilen som den skrivs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEnvelope {
    pub person: Vec<PersonBackup>,
    pub report: Vec<Report>,
    pub marker_annotation: Vec<MarkerAnnotation>,
    pub reminders: Vec<Reminder>,
    pub backup_date: DateTime<Utc>,
    #[serde(rename = "backupID")]
    pub backup_id: String,
}

/// Backupfilen som den läses.
///
/// Äldre versioner saknar `markerAnnotation` och `reminders`; då lämnas de
/// tabellerna orörda vid återställning.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingBackup {
    #[serde(rename = "backupID")]
    pub backup_id: String,
    #[serde(default)]
    pub backup_date: Option<String>,
    #[serde(default)]
    pub person: Vec<PersonBackup>,
    #[serde(default)]
    pub report: Vec<ReportRecord>,
    #[serde(default)]
    pub marker_annotation: Option<Vec<MarkerAnnotation>>,
    #[serde(default)]
    pub reminders: Option<Vec<Reminder>>,
}

/// Rapport i en inläst backup, datum fortfarande som text
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportRecord {
    pub date: Option<String>,
    pub hours: f64,
    pub bible_studies: i64,
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,
    pub credit_hours: Option<f64>,
    pub comment: Option<String>,
    #[serde(rename = "created_at")]
    pub created_at: Option<String>,
}

impl ReportRecord {
    /// Konvertera till en rapport; datum som saknas eller inte går att
    /// tolka blir `now`
    pub fn into_report(self, now: DateTime<Utc>) -> Report {
        Report {
            id: None,
            date: self.date.as_deref().and_then(parse_timestamp).unwrap_or(now),
            hours: self.hours,
            bible_studies: self.bible_studies,
            report_type: self.report_type,
            credit_hours: self.credit_hours,
            comment: self.comment,
            created_at: self.created_at.as_deref().and_then(parse_timestamp).unwrap_or(now),
        }
    }
}

/// Delningsfil för en enskild person (`<namn>.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedPerson {
    pub data: Person,
    #[serde(default)]
    pub tags: Vec<SharedTag>,
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,
    #[serde(default)]
    pub share_id: String,
}
