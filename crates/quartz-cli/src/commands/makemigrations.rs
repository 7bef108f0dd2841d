//! The `makemigrations` management command.
//!
//! Compiles every blueprint's `.sql` migration files: scans what each file
//! creates, resolves what each file references, and writes one `.json`
//! artifact per migration holding its dependency list and verbatim SQL.

use async_trait::async_trait;
use quartz_core::{BlueprintRegistry, QuartzError, Settings};
use quartz_migrations::Compiler;

use crate::command::ManagementCommand;

/// Compiles migration sources into applyable artifacts.
pub struct MakemigrationsCommand;

#[async_trait]
impl ManagementCommand for MakemigrationsCommand {
    fn name(&self) -> &'static str {
        "makemigrations"
    }

    fn help(&self) -> &'static str {
        "Compile migration files and resolve their dependencies"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("project-dir")
                .long("project-dir")
                .default_value(".")
                .help("Directory containing the blueprint folders"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), QuartzError> {
        let project_dir = matches
            .get_one::<String>("project-dir")
            .map_or(".", String::as_str);

        let blueprints = BlueprintRegistry::from_settings(settings)?;
        let report = Compiler::new(project_dir, settings, &blueprints).compile()?;

        let with_warnings = report
            .compiled
            .iter()
            .filter(|c| !c.warnings.is_empty())
            .count();
        tracing::info!(
            compiled = report.compiled.len(),
            with_warnings,
            skipped_blueprints = report.skipped_blueprints.len(),
            "makemigrations finished"
        );
        Ok(())
    }
}
