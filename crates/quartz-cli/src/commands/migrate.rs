//! The `migrate` management command.
//!
//! Applies compiled migrations to their databases, dependencies first,
//! skipping everything the ledger already records.

use async_trait::async_trait;
use quartz_core::{BlueprintRegistry, QuartzError, Settings};
use quartz_migrations::{Applier, MigrationStatus, MySqlFactory};

use crate::command::ManagementCommand;

/// Applies compiled migrations.
pub struct MigrateCommand;

#[async_trait]
impl ManagementCommand for MigrateCommand {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn help(&self) -> &'static str {
        "Apply compiled migrations to the configured databases"
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
        let factory = MySqlFactory;
        let report = Applier::new(project_dir, settings, &blueprints, &factory)
            .migrate()
            .await?;

        for result in &report.results {
            if let MigrationStatus::Failed(reason) = &result.status {
                tracing::error!(migration = %result.reference, "not applied: {reason}");
            }
        }
        tracing::info!(
            applied = report.applied(),
            failed = report.failed(),
            recorded = report.flushed,
            "migrate finished"
        );

        if let Some(flush_error) = report.flush_error {
            return Err(QuartzError::IntegrityError(flush_error));
        }
        Ok(())
    }
}
