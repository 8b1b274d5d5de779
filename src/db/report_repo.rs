use anyhow::{anyhow, Result};
use chrono::{DateTime, Months, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use tracing::info;

use super::{from_db_timestamp, lock, to_db_timestamp};
use crate::models::{Report, ReportSummary, ReportType, ServiceYear};
use crate::utils::date::start_of_day_utc;
use crate::utils::AppError;

/// Hur länge rapporter sparas innan de rensas
pub const REPORT_RETENTION_MONTHS: u32 = 24;

pub struct ReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Hämta alla rapporter, äldst först
    pub fn find_all(&self) -> Result<Vec<Report>> {
        let conn = lock(&self.conn)?;
        Self::find_all_with(&conn)
    }

    /// Rapporter med `from <= date < to`
    pub fn find_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Report>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, date, hours, bible_studies, type, credit_hours, comment, created_at
             FROM reports
             WHERE date >= ?1 AND date < ?2
             ORDER BY date, id",
        )?;

        let reports = stmt
            .query_map(params![to_db_timestamp(&from), to_db_timestamp(&to)], Self::row_to_report)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(reports)
    }

    pub fn find_by_service_year(&self, year: ServiceYear) -> Result<Vec<Report>> {
        let from = start_of_day_utc(year.start());
        let to = start_of_day_utc(year.next().start());
        self.find_between(from, to)
    }

    pub fn summarize_service_year(&self, year: ServiceYear) -> Result<ReportSummary> {
        let reports = self.find_by_service_year(year)?;
        Ok(ReportSummary::from_reports(&reports))
    }

    pub fn create(&self, report: &mut Report) -> Result<i64> {
        Self::validate(report)?;

        let conn = lock(&self.conn)?;
        let id = Self::insert_with(&conn, report)?;
        report.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, report: &Report) -> Result<()> {
        let id = report.id.ok_or_else(|| anyhow!("Rapport har inget ID"))?;
        Self::validate(report)?;

        let conn = lock(&self.conn)?;
        let rows = conn.execute(
            "UPDATE reports SET date = ?1, hours = ?2, bible_studies = ?3, type = ?4,
                                credit_hours = ?5, comment = ?6
             WHERE id = ?7",
            params![
                to_db_timestamp(&report.date),
                report.hours,
                report.bible_studies,
                report.report_type.map(|t| t.to_string()),
                report.credit_hours,
                report.comment,
                id,
            ],
        )?;

        if rows == 0 {
            return Err(AppError::not_found(format!("Rapport med ID {}", id)).into());
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = lock(&self.conn)?;
        let rows = conn.execute("DELETE FROM reports WHERE id = ?", [id])?;

        if rows == 0 {
            return Err(AppError::not_found(format!("Rapport med ID {}", id)).into());
        }
        Ok(())
    }

    pub fn count(&self) -> Result<i64> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Ta bort rapporter daterade före `cutoff`
    pub fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = lock(&self.conn)?;
        let rows = conn.execute(
            "DELETE FROM reports WHERE date < ?",
            [to_db_timestamp(&cutoff)],
        )?;
        Ok(rows)
    }

    /// Rensa rapporter äldre än två år räknat från `now`
    pub fn prune_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now
            .checked_sub_months(Months::new(REPORT_RETENTION_MONTHS))
            .ok_or_else(|| anyhow!("Ogiltig tidpunkt för rensning: {}", now))?;

        let removed = self.prune_older_than(cutoff)?;
        if removed > 0 {
            info!("Rensade {} rapporter äldre än {}", removed, cutoff.date_naive());
        }
        Ok(removed)
    }

    pub fn find_all_with(conn: &Connection) -> Result<Vec<Report>> {
        let mut stmt = conn.prepare(
            "SELECT id, date, hours, bible_studies, type, credit_hours, comment, created_at
             FROM reports
             ORDER BY date, id",
        )?;

        let reports = stmt
            .query_map([], Self::row_to_report)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(reports)
    }

    pub fn insert_with(conn: &Connection, report: &Report) -> Result<i64> {
        conn.execute(
            "INSERT INTO reports (date, hours, bible_studies, type, credit_hours, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                to_db_timestamp(&report.date),
                report.hours,
                report.bible_studies,
                report.report_type.map(|t| t.to_string()),
                report.credit_hours,
                report.comment,
                to_db_timestamp(&report.created_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn delete_all_with(conn: &Connection) -> Result<usize> {
        Ok(conn.execute("DELETE FROM reports", [])?)
    }

    fn validate(report: &Report) -> Result<()> {
        if !report.hours.is_finite() || report.hours < 0.0 {
            return Err(AppError::validation("Timmar måste vara noll eller mer").into());
        }
        if report.credit_hours.is_some_and(|h| !h.is_finite() || h < 0.0) {
            return Err(AppError::validation("Kredittimmar måste vara noll eller mer").into());
        }
        if report.bible_studies < 0 {
            return Err(AppError::validation("Antal studier kan inte vara negativt").into());
        }
        Ok(())
    }

    fn row_to_report(row: &Row) -> rusqlite::Result<Report> {
        let date: String = row.get(1)?;
        let created_at: String = row.get(7)?;
        Ok(Report {
            id: Some(row.get(0)?),
            date: from_db_timestamp(&date).unwrap_or_else(Utc::now),
            hours: row.get(2)?,
            bible_studies: row.get(3)?,
            report_type: row
                .get::<_, Option<String>>(4)?
                .as_deref()
                .and_then(ReportType::from_db_str),
            credit_hours: row.get(5)?,
            comment: row.get(6)?,
            created_at: from_db_timestamp(&created_at).unwrap_or_else(Utc::now),
        })
    }
}
