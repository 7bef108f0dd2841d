//! Built-in management commands.
//!
//! Each command implements the
//! [`ManagementCommand`](crate::command::ManagementCommand) trait.

pub mod makemigrations;
pub mod migrate;
pub mod preparemigrationfolders;

pub use makemigrations::MakemigrationsCommand;
pub use migrate::MigrateCommand;
pub use preparemigrationfolders::PrepareMigrationFoldersCommand;

use crate::command::CommandRegistry;

/// Registers all built-in management commands into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(PrepareMigrationFoldersCommand));
    registry.register(Box::new(MakemigrationsCommand));
    registry.register(Box::new(MigrateCommand));
}
