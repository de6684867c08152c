//! Reseed a database table from a CSV file.
//!
//! The crate backs the `seed` command: it empties a table and bulk-inserts
//! the rows of a CSV file, optionally restricted to a subset of columns.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use zipcode_seed::prelude::*;
//!
//! let pool = zipcode_seed::db::connect("postgres://localhost/zipcodes").await?;
//! let seeder = Seeder::new(pool, "zipcodes");
//!
//! let result = seeder
//!     .reseed("data/zipcodes.csv", &ColumnSpec::parse("zip,city,state"))
//!     .await?;
//! println!("Seeded {} rows", result.rows);
//! ```

pub mod columns;
pub mod command;
pub mod config;
pub mod db;
pub mod source;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::columns::ColumnSpec;
    pub use crate::command::{
        AssumeYes, CommandError, Confirm, Outcome, PromptConfirm, SeedArgs, SeedCommand,
    };
    pub use crate::config::{ConfigError, SeedConfig};
    pub use crate::db::{SeedError, SeedResult, Seeder};
    pub use crate::source::{CsvHeader, CsvSource, PrepareError, PreparedData, Row};
}
