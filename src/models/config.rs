use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::utils::path::{get_config_path, get_data_dir};

/// Nycklar för beständiga flaggor i `app_settings`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Sätts när engångsmigreringen av textdatum har körts
    DateMigrationV1Completed,
    /// Valt språk ("sv", "en", ...)
    Language,
    /// Mörk kartstil
    DarkMap,
    /// Senast visade meddelandeversion
    LastAnnouncementVersion,
    /// Antal gånger appen startats sedan senaste omdömesfrågan
    ReviewPromptCount,
}

impl SettingKey {
    pub const ALL: &'static [Self] = &[
        Self::DateMigrationV1Completed,
        Self::Language,
        Self::DarkMap,
        Self::LastAnnouncementVersion,
        Self::ReviewPromptCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateMigrationV1Completed => "date_migration_v1_completed",
            Self::Language => "language",
            Self::DarkMap => "dark_map",
            Self::LastAnnouncementVersion => "last_announcement_version",
            Self::ReviewPromptCount => "review_prompt_count",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applikationskonfiguration från `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Katalog för databasen
    pub data_dir: PathBuf,
    /// Katalog där backup, delningsfiler och dokument skrivs
    pub documents_dir: PathBuf,
    /// Loggnivå (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = get_data_dir();
        Self {
            documents_dir: data_dir.join("documents"),
            data_dir,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        // Försök ladda från config-fil
        if let Ok(content) = std::fs::read_to_string(get_config_path()) {
            if let Ok(config) = toml::from_str(&content) {
                return config;
            }
        }

        Self::default()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path();
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("fspal.db")
    }

    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.documents_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_key_roundtrip() {
        for key in SettingKey::ALL {
            assert_eq!(SettingKey::from_key(key.as_str()), Some(*key));
        }
        assert_eq!(
            SettingKey::DateMigrationV1Completed.as_str(),
            "date_migration_v1_completed"
        );
    }

    #[test]
    fn test_app_config_partial_toml() {
        let loaded: AppConfig = toml::from_str(r#"log_level = "debug""#).unwrap();
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.tracing_level(), tracing::Level::DEBUG);
        assert_eq!(loaded.data_dir, AppConfig::default().data_dir);
    }

    #[test]
    fn test_app_config_toml_roundtrip() {
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/fspal"),
            documents_dir: PathBuf::from("/tmp/fspal/docs"),
            log_level: "warn".into(),
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let loaded: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.database_path(), PathBuf::from("/tmp/fspal/fspal.db"));
    }
}
