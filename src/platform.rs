//! Gränssnitt mot plattformen: dokumentväljare, delning, cache och dialoger
//!
//! Tjänsterna känner bara till traitarna. Skrivbordsimplementationerna nedan
//! används av binären; testerna har egna.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Låter användaren välja en fil att läsa in
pub trait DocumentPicker: Send + Sync {
    /// `None` om användaren avbröt
    fn pick_json(&self) -> Option<PathBuf>;
}

/// Systemets delningsfunktion
pub trait ShareSheet: Send + Sync {
    fn is_available(&self) -> bool;
    fn share(&self, path: &Path) -> Result<()>;
}

/// Nycklar för cachade frågor som vyer läser från
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Persons,
    Reports,
    Tags,
    Markers,
    Reminders,
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Self::Persons => "persons",
            Self::Reports => "reports",
            Self::Tags => "tags",
            Self::Markers => "markers",
            Self::Reminders => "reminders",
        };
        f.write_str(key)
    }
}

/// Signal till vyer att hämta om data
pub trait QueryInvalidator: Send + Sync {
    fn invalidate(&self, key: QueryKey);
}

/// Användarsynliga meddelanden
pub trait Notifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
    fn notify(&self, message: &str);
}

/// Generationsräknare per frågenyckel; en vy hämtar om när räknaren ändrats
#[derive(Debug, Default)]
pub struct QueryCache {
    generations: Mutex<HashMap<QueryKey, u64>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self, key: QueryKey) -> u64 {
        self.generations
            .lock()
            .map(|g| g.get(&key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl QueryInvalidator for QueryCache {
    fn invalidate(&self, key: QueryKey) {
        if let Ok(mut generations) = self.generations.lock() {
            *generations.entry(key).or_insert(0) += 1;
        }
        tracing::debug!("Invaliderade fråga '{}'", key);
    }
}

/// Skriver meddelanden till loggen
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, title: &str, message: &str) {
        tracing::error!("{}: {}", title, message);
    }

    fn notify(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Väljare med en sökväg given i förväg (t.ex. från kommandoraden)
pub struct FixedPicker(pub Option<PathBuf>);

impl DocumentPicker for FixedPicker {
    fn pick_json(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// Systemets fildialog
pub struct DialogPicker;

impl DocumentPicker for DialogPicker {
    fn pick_json(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Välj fil")
            .add_filter("JSON", &["json"])
            .pick_file()
    }
}

/// Öppnar katalogen med den delade filen i filhanteraren
pub struct FolderShareSheet;

impl ShareSheet for FolderShareSheet {
    fn is_available(&self) -> bool {
        true
    }

    fn share(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or(path);
        open::that(dir).with_context(|| format!("Kunde inte öppna {}", dir.display()))?;
        Ok(())
    }
}

/// Ingen delning, filen skrivs bara
pub struct NoShareSheet;

impl ShareSheet for NoShareSheet {
    fn is_available(&self) -> bool {
        false
    }

    fn share(&self, _path: &Path) -> Result<()> {
        Err(crate::utils::AppError::ShareUnavailable.into())
    }
}
