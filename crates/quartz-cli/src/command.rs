//! The management-command layer.
//!
//! `quartz-admin` is a thin dispatcher. Each operation implements
//! [`ManagementCommand`] and is registered by name in a [`CommandRegistry`];
//! the registry turns itself into a clap CLI (one subcommand per command)
//! and routes the parsed invocation back to the matching handler.
//!
//! Projects embedding quartz can register their own commands next to the
//! built-in ones:
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use quartz_cli::command::ManagementCommand;
//! use quartz_core::{QuartzError, Settings};
//!
//! struct SeedCommand;
//!
//! #[async_trait]
//! impl ManagementCommand for SeedCommand {
//!     fn name(&self) -> &str { "seed" }
//!     fn help(&self) -> &str { "Load fixture data" }
//!
//!     async fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         _settings: &Settings,
//!     ) -> Result<(), QuartzError> {
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use quartz_core::{QuartzError, Settings};

/// One operation invocable as `quartz-admin <name>`.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// The subcommand name.
    fn name(&self) -> &str;

    /// One-line description shown in `quartz-admin --help`.
    fn help(&self) -> &str;

    /// Declares the command's arguments on its clap subcommand.
    ///
    /// The default takes no arguments.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command against parsed arguments and project settings.
    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), QuartzError>;
}

/// Holds every registered command, keyed and listed by name.
pub struct CommandRegistry {
    commands: BTreeMap<String, Box<dyn ManagementCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Registers a command under its own name, replacing any earlier
    /// registration of that name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Looks up a registered command by name.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Assembles the `quartz-admin` CLI with one subcommand per registered
    /// command, in name order.
    pub fn build_cli(&self) -> clap::Command {
        let mut cli = clap::Command::new("quartz-admin")
            .about("quartz management utility")
            .subcommand_required(true);

        for (name, command) in &self.commands {
            // clap wants 'static command names; registration happens once
            // per process, so leaking them is bounded.
            let name: &'static str = Box::leak(name.clone().into_boxed_str());
            let subcommand = command
                .add_arguments(clap::Command::new(name).about(command.help().to_string()));
            cli = cli.subcommand(subcommand);
        }
        cli
    }

    /// Dispatches an already-parsed invocation to its handler.
    pub async fn execute(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), QuartzError> {
        let (name, sub_matches) = matches.subcommand().ok_or_else(|| {
            QuartzError::ConfigurationError("No subcommand specified".to_string())
        })?;
        let command = self
            .get(name)
            .ok_or_else(|| QuartzError::ConfigurationError(format!("Unknown command: {name}")))?;
        command.handle(sub_matches, settings).await
    }
}
