use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fspal")]
#[command(version, about = "Håll ordning på besök, uppföljningar och rapporter", long_about = None)]
pub struct Cli {
    /// Skriv bara filer, öppna inte katalogen efteråt
    #[arg(long, global = true)]
    pub no_share: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Skriv fspal_backup.json i dokumentkatalogen
    Backup,
    /// Ersätt databasens innehåll med en backup
    Restore {
        /// Backupfil; utan argument öppnas en fildialog
        file: Option<PathBuf>,
    },
    /// Visa resultatet av migreringen av gamla datum
    MigrateDates,
    /// Ta bort rapporter äldre än 24 månader
    PruneReports,
    /// Exportera personlistan som Word-dokument
    ExportDocx {
        /// Ta med uppföljningar under varje person
        #[arg(long)]
        follow_ups: bool,
    },
    /// Skriv en delningsfil för en person
    SharePerson {
        id: i64,
    },
    /// Lägg till en person från en delningsfil
    ImportPerson {
        file: Option<PathBuf>,
    },
    /// Summera rapporter för ett tjänsteår
    ServiceYear {
        /// Året då tjänsteåret slutar (standard: innevarande)
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Ta bort en etikett som inte används
    DeleteTag {
        name: String,
    },
    /// Lista kartmarkörer
    Markers,
}
