//! The `preparemigrationfolders` management command.
//!
//! Creates the on-disk migration layout for every installed blueprint:
//! `<blueprint>/migrations/<db_folder>/` for each configured database
//! folder. Existing directories are left untouched.

use std::path::Path;

use async_trait::async_trait;
use quartz_core::{BlueprintRegistry, QuartzError, Settings};

use crate::command::ManagementCommand;

/// Creates the migration directory skeleton.
pub struct PrepareMigrationFoldersCommand;

#[async_trait]
impl ManagementCommand for PrepareMigrationFoldersCommand {
    fn name(&self) -> &'static str {
        "preparemigrationfolders"
    }

    fn help(&self) -> &'static str {
        "Create the migration folder layout for every installed blueprint"
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
        for blueprint in blueprints.blueprints() {
            let databases = settings.databases_for(blueprint);
            let migrations_dir = Path::new(project_dir).join(blueprint.migrations_dir());
            for db_folder in databases.keys() {
                let dir = migrations_dir.join(db_folder);
                std::fs::create_dir_all(&dir)?;
                tracing::debug!(dir = %dir.display(), "migration folder ready");
            }
        }
        Ok(())
    }
}
