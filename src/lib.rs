//! FS Pal - kärnan i en app för att hålla ordning på besök i fälttjänsten
//!
//! Personer, uppföljningar, etiketter och rapporter i SQLite, med backup,
//! återställning och delning som JSON.

pub mod db;
pub mod models;
pub mod platform;
pub mod services;
pub mod utils;

// Re-exports
pub use db::Database;
pub use models::*;
pub use utils::{AppError, AppResult};
