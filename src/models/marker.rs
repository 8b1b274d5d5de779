use serde::{Deserialize, Serialize};

/// Fristående kartanteckning, oberoende av personer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerAnnotation {
    #[serde(skip)]
    pub id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub text: String,
}

impl MarkerAnnotation {
    pub fn new(latitude: f64, longitude: f64, text: impl Into<String>) -> Self {
        Self {
            id: None,
            latitude,
            longitude,
            text: text.into(),
        }
    }
}
