//! FS Pal - kommandoradsingång

mod cli;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use fspal::db::Database;
use fspal::models::{AppConfig, ServiceYear};
use fspal::platform::{
    DialogPicker, DocumentPicker, FixedPicker, FolderShareSheet, LogNotifier, NoShareSheet,
    QueryCache, ShareSheet,
};
use fspal::services::{marker_positions, DateMigrator, MenuActions, MigrationReport};
use fspal::utils::path::display_path;
use fspal::utils::AppError;

fn init_logging(config: &AppConfig) {
    // RUST_LOG går före nivån i config.toml
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.tracing_level().to_string().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Plattformsdelar som lever hela körningen
struct Platform {
    cache: QueryCache,
    notifier: LogNotifier,
    share_sheet: Box<dyn ShareSheet>,
}

impl Platform {
    fn actions<'a>(
        &'a self,
        db: &'a Database,
        config: &AppConfig,
        picker: &'a dyn DocumentPicker,
    ) -> MenuActions<'a> {
        MenuActions::new(
            db,
            config.documents_dir.clone(),
            picker,
            self.share_sheet.as_ref(),
            &self.cache,
            &self.notifier,
        )
    }
}

fn picker_for(file: Option<PathBuf>) -> Box<dyn DocumentPicker> {
    match file {
        Some(path) => Box::new(FixedPicker(Some(path))),
        None => Box::new(DialogPicker),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();
    init_logging(&config);

    tracing::info!("Startar FS Pal v{}", env!("CARGO_PKG_VERSION"));

    config
        .ensure_directories()
        .context("Kunde inte skapa datakataloger")?;
    let db = Database::open(&config.database_path())?;
    db.migrate()?;

    // Inställningstabellen finns nu, så migreringen kan läsa sin flagga
    let migration = match DateMigrator::new(&db).run() {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Datummigreringen kunde inte köras: {:#}", e);
            MigrationReport::default()
        }
    };

    let platform = Platform {
        cache: QueryCache::new(),
        notifier: LogNotifier,
        share_sheet: if cli.no_share {
            Box::new(NoShareSheet)
        } else {
            Box::new(FolderShareSheet)
        },
    };
    let no_file = FixedPicker(None);
    let failed = |what: &str| anyhow!("{} misslyckades", what);

    match cli.command {
        Commands::Backup => {
            let result = platform
                .actions(&db, &config, &no_file)
                .backup()
                .ok_or_else(|| failed("Säkerhetskopiering"))?;
            println!("{} ({})", display_path(&result.path), result.size_display());
        }
        Commands::Restore { file } => {
            let picker = picker_for(file);
            let result = platform
                .actions(&db, &config, picker.as_ref())
                .restore()
                .ok_or_else(|| failed("Återställning"))?;
            println!(
                "Återställde {} personer, {} rapporter, {} etikettkopplingar, {} uppföljningar",
                result.persons, result.reports, result.tag_links, result.follow_ups
            );
        }
        Commands::MigrateDates => {
            if migration.already_completed {
                println!("Datummigreringen är redan genomförd");
            } else {
                println!(
                    "{} lästa, {} migrerade, {} överhoppade, {} fel",
                    migration.scanned, migration.migrated, migration.skipped, migration.errors
                );
            }
        }
        Commands::PruneReports => {
            let removed = db.reports().prune_expired(Utc::now())?;
            println!("Tog bort {} rapporter", removed);
        }
        Commands::ExportDocx { follow_ups } => {
            let result = platform
                .actions(&db, &config, &no_file)
                .export_docx(follow_ups)
                .ok_or_else(|| failed("Export"))?;
            println!("{}", display_path(&result.path));
        }
        Commands::SharePerson { id } => {
            let path = platform
                .actions(&db, &config, &no_file)
                .share_person(id)
                .ok_or_else(|| failed("Delning"))?;
            println!("{}", display_path(&path));
        }
        Commands::ImportPerson { file } => {
            let picker = picker_for(file);
            let id = platform
                .actions(&db, &config, picker.as_ref())
                .import_person()
                .ok_or_else(|| failed("Import"))?;
            println!("Importerade person med ID {}", id);
        }
        Commands::ServiceYear { year } => {
            let year = year.map(ServiceYear::new).unwrap_or_else(ServiceYear::current);
            let summary = db.reports().summarize_service_year(year)?;
            println!("Tjänsteår {}", year.label());
            println!("  Rapporter:     {}", summary.entries);
            println!("  Timmar:        {:.1}", summary.hours);
            println!("  Krediterade:   {:.1}", summary.credit_hours);
            println!("  Totalt:        {:.1}", summary.total_hours());
            println!("  Bibelstudier:  {}", summary.bible_studies);
        }
        Commands::DeleteTag { name } => {
            let tags = db.tags();
            let tag = tags
                .find_by_name(&name)?
                .ok_or_else(|| AppError::not_found(format!("Etikett '{}'", name)))?;
            tags.delete(tag.id.ok_or_else(|| anyhow!("Etikett utan ID"))?)?;
            println!("Etiketten '{}' togs bort", tag.name);
        }
        Commands::Markers => {
            for marker in marker_positions(&db.persons().find_all()?) {
                println!(
                    "{:>10.6} {:>11.6}  {}{}",
                    marker.latitude,
                    marker.longitude,
                    marker.title,
                    if marker.is_private { " (privat)" } else { "" }
                );
            }
        }
    }

    Ok(())
}
