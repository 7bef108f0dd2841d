//! # quartz-migrations
//!
//! The quartz migration engine. Migrations are hand-written `.sql` files
//! arranged as `<blueprint>/migrations/<db_folder>/<name>.sql`; this crate
//! infers the order to run them in instead of asking authors to declare it.
//!
//! `make_migrations` (the [`compiler`]) scans every file for the tables,
//! indexes and triggers it creates, resolves every reference each file
//! makes against those creations, and writes a compiled `.json` artifact
//! holding the resolved dependency list plus the untouched SQL. `migrate`
//! (the [`applier`]) reads the artifacts and applies each migration after
//! its dependencies, skipping whatever the [`ledger`] already records.

pub mod applier;
pub mod compiler;
pub mod extract;
pub mod ledger;
pub mod reference;
pub mod registry;
pub mod resolver;

pub use applier::{
    Applier, BackendFactory, MigrateReport, MigrationReport, MigrationStatus, MySqlFactory,
};
pub use compiler::{CompileOutcome, CompileReport, CompiledMigration, Compiler};
pub use ledger::Ledger;
pub use reference::MigrationRef;
pub use registry::CreationRegistry;
pub use resolver::{Resolution, Resolver};
