//! Migration application.
//!
//! `migrate` reads compiled artifacts and applies them depth-first:
//! every dependency is applied before the migration itself, and anything
//! already in the ledger or already applied earlier in the run is skipped.
//! One connection pool per (blueprint, database-folder) pair is opened at
//! the start of the run and closed at the end; nothing is process-global.
//!
//! A failed migration never stops the run. It is reported, its dependents
//! are reported as failed without executing, and unrelated migrations
//! still apply. Successes are buffered in the ledger and flushed once at
//! the end.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tracing::{error, info, warn};

use quartz_core::{
    BlueprintRegistry, DatabaseSettings, QuartzError, QuartzResult, Settings,
};
use quartz_db::{DatabaseBackend, MySqlBackend};

use crate::compiler::{migration_files, CompiledMigration};
use crate::ledger::Ledger;
use crate::reference::MigrationRef;

/// Creates database backends for an apply run.
///
/// The run asks for one backend per (blueprint, database-folder) pair plus
/// one for the ledger, and closes each of them when it finishes.
pub trait BackendFactory: Send + Sync {
    fn connect(&self, settings: &DatabaseSettings) -> QuartzResult<Arc<dyn DatabaseBackend>>;
}

/// The default factory: a `mysql_async` pool per database.
pub struct MySqlFactory;

impl BackendFactory for MySqlFactory {
    fn connect(&self, settings: &DatabaseSettings) -> QuartzResult<Arc<dyn DatabaseBackend>> {
        Ok(Arc::new(MySqlBackend::from_settings(settings)?))
    }
}

/// Terminal state of one migration within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Executed and recorded in this run.
    Applied,
    /// Found in the ledger or applied earlier in this run.
    AlreadyApplied,
    /// Not applied; the message says why.
    Failed(String),
}

/// One migration's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub reference: MigrationRef,
    pub status: MigrationStatus,
}

/// The outcome of one `migrate` run.
#[derive(Debug, Default)]
pub struct MigrateReport {
    /// Every migration visited, in the order its outcome was decided.
    pub results: Vec<MigrationReport>,
    /// Ledger entries written at the end of the run.
    pub flushed: usize,
    /// The ledger-flush failure, if any. Schema changes stay applied.
    pub flush_error: Option<String>,
    /// Blueprints whose migrations directory was missing.
    pub skipped_blueprints: Vec<String>,
}

impl MigrateReport {
    pub fn applied(&self) -> usize {
        self.count(|s| matches!(s, MigrationStatus::Applied))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, MigrationStatus::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&MigrationStatus) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.status)).count()
    }
}

/// Applies compiled migrations for every installed blueprint.
pub struct Applier<'a> {
    base_dir: PathBuf,
    settings: &'a Settings,
    blueprints: &'a BlueprintRegistry,
    factory: &'a dyn BackendFactory,
}

impl<'a> Applier<'a> {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        settings: &'a Settings,
        blueprints: &'a BlueprintRegistry,
        factory: &'a dyn BackendFactory,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            settings,
            blueprints,
            factory,
        }
    }

    /// Runs the whole migrate operation.
    ///
    /// # Errors
    ///
    /// Returns an error only for configuration problems detected before any
    /// migration runs: no ledger database designated, or a ledger that
    /// cannot be bootstrapped or read.
    pub async fn migrate(&self) -> QuartzResult<MigrateReport> {
        let ledger_settings = self.settings.ledger_database()?;
        let ledger_backend = self.factory.connect(ledger_settings)?;
        let mut ledger = Ledger::new(ledger_backend.clone());

        ledger.ensure_table().await.map_err(|e| {
            QuartzError::ConfigurationError(format!(
                "Cannot prepare the migrations ledger. Check the [migrations_table] \
                 section or the default database in settings: {e}"
            ))
        })?;
        let earlier_applied = ledger.load().await.map_err(|e| {
            QuartzError::ConfigurationError(format!(
                "Cannot read the migrations ledger. Check the [migrations_table] \
                 section or the default database in settings: {e}"
            ))
        })?;

        let mut report = MigrateReport::default();
        let (pools, targets) = self.open_pools(&mut report)?;

        let mut walk = ApplyWalk {
            base_dir: &self.base_dir,
            blueprints: self.blueprints,
            pools: &pools,
            ledger: &mut ledger,
            applied: earlier_applied,
            in_progress: HashSet::new(),
            statuses: HashMap::new(),
            order: Vec::new(),
        };

        for (blueprint, db_folder, folder_path) in &targets {
            for path in migration_files(folder_path, "json")? {
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let reference = MigrationRef::new(blueprint.clone(), db_folder.clone(), stem);
                walk.apply(reference, 0).await;
            }
        }

        for reference in walk.order {
            let status = walk.statuses[&reference].clone();
            report.results.push(MigrationReport { reference, status });
        }

        match ledger.flush().await {
            Ok(written) => report.flushed = written,
            Err(err) => {
                error!("ledger flush failed: {err}");
                report.flush_error = Some(err.to_string());
            }
        }

        for backend in pools.values() {
            if let Err(err) = backend.close().await {
                warn!("failed to close a database pool: {err}");
            }
        }
        if let Err(err) = ledger_backend.close().await {
            warn!("failed to close the ledger pool: {err}");
        }
        Ok(report)
    }

    /// Opens one pool per discovered (blueprint, database-folder) pair.
    #[allow(clippy::type_complexity)]
    fn open_pools(
        &self,
        report: &mut MigrateReport,
    ) -> QuartzResult<(
        HashMap<String, Arc<dyn DatabaseBackend>>,
        Vec<(String, String, PathBuf)>,
    )> {
        let mut pools: HashMap<String, Arc<dyn DatabaseBackend>> = HashMap::new();
        let mut targets = Vec::new();

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
                let key = format!("{}/{}", blueprint.name(), db_folder);
                pools.insert(key, self.factory.connect(&databases[&db_folder])?);
                targets.push((
                    blueprint.name().to_string(),
                    db_folder.clone(),
                    migrations_dir.join(&db_folder),
                ));
            }
        }
        Ok((pools, targets))
    }
}

struct ApplyWalk<'a> {
    base_dir: &'a Path,
    blueprints: &'a BlueprintRegistry,
    pools: &'a HashMap<String, Arc<dyn DatabaseBackend>>,
    ledger: &'a mut Ledger,
    applied: HashSet<MigrationRef>,
    in_progress: HashSet<MigrationRef>,
    statuses: HashMap<MigrationRef, MigrationStatus>,
    order: Vec<MigrationRef>,
}

impl ApplyWalk<'_> {
    /// Applies one migration after its dependencies, depth-first.
    ///
    /// Failures are absorbed into [`MigrationStatus::Failed`]; the walk
    /// itself never errors so sibling migrations still run.
    fn apply<'s>(
        &'s mut self,
        reference: MigrationRef,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = MigrationStatus> + Send + 's>> {
        Box::pin(async move {
            if let Some(status) = self.statuses.get(&reference) {
                return status.clone();
            }
            if self.applied.contains(&reference) {
                info!(migration = %reference, depth, "already applied, skipping");
                return self.finish(reference, MigrationStatus::AlreadyApplied);
            }
            if self.in_progress.contains(&reference) {
                // Revisiting a migration that is still being applied means
                // the dependency graph loops.
                let err = QuartzError::CyclicDependency(reference.to_string());
                error!("{err}");
                return MigrationStatus::Failed(err.to_string());
            }
            self.in_progress.insert(reference.clone());

            let status = self.apply_inner(&reference, depth).await;
            self.in_progress.remove(&reference);
            self.finish(reference, status)
        })
    }

    async fn apply_inner(&mut self, reference: &MigrationRef, depth: usize) -> MigrationStatus {
        let compiled = match self.read_artifact(reference) {
            Ok(compiled) => compiled,
            Err(err) => {
                return MigrationStatus::Failed(format!(
                    "Cannot read compiled migration '{reference}': {err}"
                ))
            }
        };

        for dependency in &compiled.dependencies {
            info!(migration = %reference, %dependency, depth, "applying dependency first");
            if let MigrationStatus::Failed(reason) =
                self.apply(dependency.clone(), depth + 1).await
            {
                return MigrationStatus::Failed(format!(
                    "Dependency '{dependency}' failed: {reason}"
                ));
            }
        }

        let Some(backend) = self.pools.get(&reference.pool_key()) else {
            return MigrationStatus::Failed(format!(
                "No database is configured for '{}'",
                reference.pool_key()
            ));
        };
        match backend.execute_script(&compiled.operations).await {
            Ok(()) => {
                self.applied.insert(reference.clone());
                self.ledger.record(reference);
                info!(migration = %reference, depth, "migration applied");
                MigrationStatus::Applied
            }
            Err(err) => {
                error!(migration = %reference, depth, "migration failed: {err}");
                MigrationStatus::Failed(err.to_string())
            }
        }
    }

    fn read_artifact(&self, reference: &MigrationRef) -> QuartzResult<CompiledMigration> {
        let migrations_dir = self.blueprints.get(&reference.blueprint).map_or_else(
            || PathBuf::from(&reference.blueprint).join("migrations"),
            |bp| bp.migrations_dir(),
        );
        let path = self
            .base_dir
            .join(migrations_dir)
            .join(&reference.db_folder)
            .join(format!("{}.json", reference.name));
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn finish(&mut self, reference: MigrationRef, status: MigrationStatus) -> MigrationStatus {
        self.statuses.insert(reference.clone(), status.clone());
        self.order.push(reference);
        status
    }
}
