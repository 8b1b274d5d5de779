use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::date::deserialize_optional_timestamp;

/// Besökskategori för en person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisitCategory {
    /// Återbesök ej gjort ännu
    #[default]
    CallAgain,
    /// Återbesök
    ReturnVisit,
    /// Bibelstudium
    BibleStudy,
}

impl VisitCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CallAgain => "Besök igen",
            Self::ReturnVisit => "Återbesök",
            Self::BibleStudy => "Bibelstudium",
        }
    }

    pub fn all() -> &'static [VisitCategory] {
        &[Self::CallAgain, Self::ReturnVisit, Self::BibleStudy]
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "return-visit" => Self::ReturnVisit,
            "bible-study" => Self::BibleStudy,
            _ => Self::CallAgain,
        }
    }
}

impl fmt::Display for VisitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallAgain => write!(f, "call-again"),
            Self::ReturnVisit => write!(f, "return-visit"),
            Self::BibleStudy => write!(f, "bible-study"),
        }
    }
}

/// Hur regelbundet personen tar emot besök
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterestStatus {
    #[default]
    Irregular,
    Frequent,
    Committed,
}

impl InterestStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Irregular => "Oregelbunden",
            Self::Frequent => "Ofta",
            Self::Committed => "Engagerad",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "frequent" => Self::Frequent,
            "committed" => Self::Committed,
            _ => Self::Irregular,
        }
    }
}

impl fmt::Display for InterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Irregular => write!(f, "irregular"),
            Self::Frequent => write!(f, "frequent"),
            Self::Committed => write!(f, "committed"),
        }
    }
}

/// En besökt person eller adress.
///
/// `id` serialiseras aldrig: allt som går ut i JSON (backup, delning) ska
/// vara fritt från databasens lokala ID:n.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Person {
    #[serde(skip)]
    pub id: Option<i64>,
    pub name: String,
    pub block: Option<String>,
    pub unit: Option<String>,
    pub street: Option<String>,
    pub contact: Option<String>,
    pub category: VisitCategory,
    pub remarks: Option<String>,
    pub publications: Option<String>,
    /// Äldre textdatum, t.ex. "03/03/25" eller RFC 3339 efter migrering
    pub date: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_timestamp")]
    pub initial_visit: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_private: bool,
    pub status: InterestStatus,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adressrad byggd av kvarter, lägenhet och gata
    pub fn address(&self) -> String {
        [&self.block, &self.unit, &self.street]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            "Okänd".to_string()
        } else {
            name.to_string()
        }
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.name.trim().is_empty() {
            return Err(PersonValidationError::MissingName);
        }

        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(PersonValidationError::InvalidCoordinates);
                }
            }
            (None, None) => {}
            _ => return Err(PersonValidationError::PartialCoordinates),
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersonValidationError {
    #[error("Namn krävs")]
    MissingName,
    #[error("Koordinaterna ligger utanför giltigt intervall")]
    InvalidCoordinates,
    #[error("Både latitud och longitud måste anges")]
    PartialCoordinates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address() {
        let person = Person {
            block: Some("12".into()),
            unit: Some(" ".into()),
            street: Some("Storgatan".into()),
            ..Person::new("Anna")
        };
        assert_eq!(person.address(), "12, Storgatan");
        assert_eq!(Person::new("Anna").address(), "");
    }

    #[test]
    fn test_validation() {
        assert!(Person::new("Anna").validate().is_ok());

        assert!(matches!(
            Person::new("  ").validate(),
            Err(PersonValidationError::MissingName)
        ));

        let half = Person {
            latitude: Some(59.3),
            ..Person::new("Anna")
        };
        assert!(matches!(
            half.validate(),
            Err(PersonValidationError::PartialCoordinates)
        ));

        let outside = Person {
            latitude: Some(95.0),
            longitude: Some(18.0),
            ..Person::new("Anna")
        };
        assert!(matches!(
            outside.validate(),
            Err(PersonValidationError::InvalidCoordinates)
        ));
    }

    #[test]
    fn test_serialization_has_no_id() {
        let person = Person {
            id: Some(42),
            category: VisitCategory::ReturnVisit,
            ..Person::new("Anna")
        };
        let json = serde_json::to_value(&person).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["category"], "return-visit");
        assert_eq!(json["isPrivate"], false);

        let back: Person = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, None);
        assert_eq!(back.name, "Anna");
    }

    #[test]
    fn test_category_db_str() {
        for category in VisitCategory::all() {
            assert_eq!(VisitCategory::from_db_str(&category.to_string()), *category);
        }
        assert_eq!(VisitCategory::from_db_str("okänd"), VisitCategory::CallAgain);
    }

    #[test]
    fn test_initial_visit_is_read_leniently() {
        let legacy: Person = serde_json::from_str(r#"{"name":"Anna","initialVisit":"03/03/25"}"#).unwrap();
        assert_eq!(
            legacy.initial_visit,
            Some(crate::utils::date::start_of_day_utc(
                chrono::NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
            ))
        );

        let broken: Person = serde_json::from_str(r#"{"name":"Erik","initialVisit":"förra våren"}"#).unwrap();
        assert_eq!(broken.name, "Erik");
        assert_eq!(broken.initial_visit, None);

        let stamped = Person {
            initial_visit: Some(Utc::now()),
            ..Person::new("Maria")
        };
        let back: Person = serde_json::from_value(serde_json::to_value(&stamped).unwrap()).unwrap();
        assert_eq!(back.initial_visit, stamped.initial_visit);
    }
}
