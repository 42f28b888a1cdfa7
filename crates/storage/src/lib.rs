#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod context;
pub mod schema;
pub mod seed;
pub mod sqlite;

mod live;

pub use config::{DATABASE_NAME, Location, StoreConfig};
pub use context::AppContext;
pub use seed::Seeded;
pub use sqlite::{SQLite, SQLiteError};
