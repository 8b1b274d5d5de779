//! Tjänster för FS Pal
//!
//! Innehåller affärslogik som inte hör hemma i databaslagret.

pub mod actions;
pub mod backup;
pub mod date_migration;
pub mod export;
pub mod guard;
pub mod map_markers;
pub mod restore;
pub mod share;

pub use actions::MenuActions;
pub use backup::{BackupResult, BackupService};
pub use date_migration::{DateMigrator, MigrationReport};
pub use export::{ExportResult, ExportService};
pub use guard::{OperationGuard, OperationToken};
pub use map_markers::{marker_positions, MapMarker};
pub use restore::{RestorePreview, RestoreResult, RestoreService};
pub use share::PersonShareService;
