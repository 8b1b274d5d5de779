use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::date::deserialize_timestamp_or_now;

/// Fri anteckning med skapandetid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(skip)]
    pub id: Option<i64>,
    #[serde(default)]
    pub note: String,
    #[serde(default = "Utc::now", deserialize_with = "deserialize_timestamp_or_now")]
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn new(note: impl Into<String>) -> Self {
        Self {
            id: None,
            note: note.into(),
            created_at: Utc::now(),
        }
    }
}
