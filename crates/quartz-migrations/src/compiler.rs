//! Migration compilation.
//!
//! `make_migrations` runs in two passes. The first pass walks every
//! blueprint's migration folders and scans each `.sql` file into the
//! creation registry. The second pass resolves each file's references
//! against that registry and writes a compiled artifact next to the
//! source: `<name>.json` holding the dependency list and the verbatim
//! original SQL. Applying migrations reads only the artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use quartz_core::{BlueprintRegistry, QuartzResult, Settings};

use crate::extract;
use crate::reference::MigrationRef;
use crate::registry::CreationRegistry;
use crate::resolver::Resolver;

/// The compiled form of one migration.
///
/// `operations` is the source file's text, byte for byte; compilation
/// never rewrites SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledMigration {
    pub dependencies: Vec<MigrationRef>,
    pub operations: String,
}

/// What compiling one migration produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    pub reference: MigrationRef,
    pub artifact_path: PathBuf,
    pub dependencies: Vec<MigrationRef>,
    pub warnings: Vec<String>,
}

/// The result of one `make_migrations` run.
#[derive(Debug, Default)]
pub struct CompileReport {
    /// Every compiled migration, in compilation order.
    pub compiled: Vec<CompileOutcome>,
    /// Blueprints skipped because their migrations directory was missing
    /// or unreadable.
    pub skipped_blueprints: Vec<String>,
}

struct MigrationSource {
    reference: MigrationRef,
    path: PathBuf,
    db_name: String,
    raw: String,
    normalized: String,
}

/// Compiles every blueprint's migrations under one project root.
pub struct Compiler<'a> {
    base_dir: PathBuf,
    settings: &'a Settings,
    blueprints: &'a BlueprintRegistry,
}

impl<'a> Compiler<'a> {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        settings: &'a Settings,
        blueprints: &'a BlueprintRegistry,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            settings,
            blueprints,
        }
    }

    /// Runs both passes and writes one artifact per migration file.
    pub fn compile(&self) -> QuartzResult<CompileReport> {
        let mut report = CompileReport::default();
        let sources = self.collect_sources(&mut report)?;

        let mut registry = CreationRegistry::new();
        for source in &sources {
            registry.scan(&source.reference, &source.db_name, &source.normalized);
        }

        let resolver = Resolver::new(&registry);
        for source in sources {
            let resolution =
                resolver.resolve(&source.reference, &source.db_name, &source.normalized);
            for warning in &resolution.warnings {
                warn!(migration = %source.reference, "{warning}");
            }

            let compiled = CompiledMigration {
                dependencies: resolution.dependencies.clone(),
                operations: source.raw,
            };
            let artifact_path = source.path.with_extension("json");
            fs::write(&artifact_path, serde_json::to_string_pretty(&compiled)?)?;
            info!(
                migration = %source.reference,
                artifact = %artifact_path.display(),
                dependencies = compiled.dependencies.len(),
                "migration compiled"
            );

            report.compiled.push(CompileOutcome {
                reference: source.reference,
                artifact_path,
                dependencies: resolution.dependencies,
                warnings: resolution.warnings,
            });
        }
        Ok(report)
    }

    fn collect_sources(&self, report: &mut CompileReport) -> QuartzResult<Vec<MigrationSource>> {
        let mut sources = Vec::new();
        for blueprint in self.blueprints.blueprints() {
            let databases = self.settings.databases_for(blueprint);
            let migrations_dir = self.base_dir.join(blueprint.migrations_dir());

            let Ok(entries) = fs::read_dir(&migrations_dir) else {
                warn!(
                    blueprint = blueprint.name(),
                    dir = %migrations_dir.display(),
                    "migrations directory is missing, blueprint skipped"
                );
                report.skipped_blueprints.push(blueprint.name().to_string());
                continue;
            };

            let mut db_folders: Vec<String> = entries
                .filter_map(Result::ok)
                .filter(|entry| entry.path().is_dir())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| databases.contains_key(name))
                .collect();
            db_folders.sort();

            for db_folder in db_folders {
                let db_name = databases[&db_folder].name.clone();
                let folder_path = migrations_dir.join(&db_folder);
                for path in migration_files(&folder_path, "sql")? {
                    let raw = fs::read_to_string(&path)?;
                    let normalized = extract::normalize(&raw);
                    let stem = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or_default()
                        .to_string();
                    sources.push(MigrationSource {
                        reference: MigrationRef::new(blueprint.name(), &db_folder, stem),
                        path,
                        db_name: db_name.clone(),
                        raw,
                        normalized,
                    });
                }
            }
        }
        Ok(sources)
    }
}

/// Lists migration files with the given extension, sorted by filename.
///
/// A migration filename must start with an ASCII letter, digit, or
/// underscore, which admits the usual `0001_users.sql` numbering while
/// ignoring hidden files and editor droppings.
pub fn migration_files(dir: &Path, extension: &str) -> QuartzResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(extension)
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.chars().next())
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        })
        .collect();
    files.sort();
    Ok(files)
}
