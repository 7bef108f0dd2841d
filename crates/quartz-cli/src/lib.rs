//! # quartz-cli
//!
//! Management commands for quartz projects.
//!
//! This crate provides the [`ManagementCommand`] trait, a
//! [`CommandRegistry`] dispatcher, and the built-in commands
//! (`preparemigrationfolders`, `makemigrations`, `migrate`) behind the
//! `quartz-admin` binary.
//!
//! ## Quick Start
//!
//! ```rust
//! use quartz_cli::command::CommandRegistry;
//! use quartz_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! assert!(registry.get("makemigrations").is_some());
//! assert!(registry.get("migrate").is_some());
//! ```

// These clippy lints are intentionally allowed:
// - result_large_err: QuartzError is the workspace-wide error type
// - module_name_repetitions: re-exports make module-prefixed names redundant
// - unused_async: command handlers maintain consistent async signatures
#![allow(clippy::result_large_err)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unused_async)]

pub mod command;
pub mod commands;

pub use command::{CommandRegistry, ManagementCommand};
pub use commands::register_builtin_commands;

use quartz_core::{QuartzError, Settings};

/// Parses `args` and runs the selected built-in command.
///
/// This is the programmatic equivalent of running `quartz-admin`; embed it
/// in an application's own entry point to expose the management commands.
pub async fn execute_from_command_line<I, T>(args: I, settings: &Settings) -> Result<(), QuartzError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);

    let matches = registry
        .build_cli()
        .try_get_matches_from(args)
        .map_err(|e| QuartzError::ConfigurationError(e.to_string()))?;
    registry.execute(&matches, settings).await
}
