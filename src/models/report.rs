use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Klassificering av en rapportpost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Ministry,
    Ldc,
    Other,
}

impl ReportType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ministry => "Tjänst",
            Self::Ldc => "Byggprojekt",
            Self::Other => "Övrigt",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "ministry" => Some(Self::Ministry),
            "ldc" => Some(Self::Ldc),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ministry => write!(f, "ministry"),
            Self::Ldc => write!(f, "ldc"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Daterad aktivitetspost, oberoende av personer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(skip)]
    pub id: Option<i64>,
    pub date: DateTime<Utc>,
    pub hours: f64,
    #[serde(default)]
    pub bible_studies: i64,
    #[serde(rename = "type", default)]
    pub report_type: Option<ReportType>,
    #[serde(default)]
    pub credit_hours: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(date: DateTime<Utc>, hours: f64) -> Self {
        Self {
            id: None,
            date,
            hours,
            bible_studies: 0,
            report_type: None,
            credit_hours: None,
            comment: None,
            created_at: Utc::now(),
        }
    }
}

/// Tjänsteår: 1 september till 31 augusti.
///
/// Identifieras av det kalenderår då året slutar, så tjänsteåret 2025 går
/// från 2024-09-01 till 2025-08-31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceYear {
    pub end_year: i32,
}

impl ServiceYear {
    pub fn new(end_year: i32) -> Self {
        Self { end_year }
    }

    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= 9 {
            Self::new(date.year() + 1)
        } else {
            Self::new(date.year())
        }
    }

    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    pub fn start(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.end_year - 1, 9, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn end(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.end_year, 8, 31).unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }

    pub fn previous(&self) -> Self {
        Self::new(self.end_year - 1)
    }

    pub fn next(&self) -> Self {
        Self::new(self.end_year + 1)
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.end_year - 1, self.end_year)
    }
}

/// Summering av ett antal rapporter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    pub entries: usize,
    pub hours: f64,
    pub credit_hours: f64,
    pub bible_studies: i64,
}

impl ReportSummary {
    pub fn from_reports(reports: &[Report]) -> Self {
        reports.iter().fold(Self::default(), |mut acc, r| {
            acc.entries += 1;
            acc.hours += r.hours;
            acc.credit_hours += r.credit_hours.unwrap_or(0.0);
            acc.bible_studies += r.bible_studies;
            acc
        })
    }

    pub fn total_hours(&self) -> f64 {
        self.hours + self.credit_hours
    }
}
