pub mod person;
pub mod follow_up;
pub mod tag;
pub mod report;
pub mod marker;
pub mod reminder;
pub mod backup;
pub mod config;

pub use person::*;
pub use follow_up::*;
pub use tag::*;
pub use report::*;
pub use marker::*;
pub use reminder::*;
pub use backup::*;
pub use config::*;
