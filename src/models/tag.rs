use serde::{Deserialize, Serialize};

/// Användardefinierad etikett, unik på normaliserat namn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<i64>,
    pub name: String,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: Self::normalize_name(name),
        }
    }

    /// Trimma och gör om till gemener
    pub fn normalize_name(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

/// Etikett i delningsfilen för en enskild person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedTag {
    pub tag_name: String,
}
