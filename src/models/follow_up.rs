use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::date::deserialize_timestamp_or_now;

/// Daterad anteckning knuten till exakt en person.
///
/// Varken `id` eller `person_id` serialiseras; i backupen bevaras kopplingen
/// till personen enbart genom nästling. Ett datum som inte går att tolka
/// vid inläsning blir `now` i stället för att stoppa hela filen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    #[serde(skip)]
    pub id: Option<i64>,
    #[serde(skip)]
    pub person_id: i64,
    #[serde(default = "Utc::now", deserialize_with = "deserialize_timestamp_or_now")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

impl FollowUp {
    pub fn new(person_id: i64, date: DateTime<Utc>, notes: impl Into<String>) -> Self {
        Self {
            id: None,
            person_id,
            date,
            notes: notes.into(),
        }
    }
}
