//! Settings for quartz projects.
//!
//! This module provides the [`Settings`] struct holding project-wide
//! configuration: the database map keyed by database folder, the `default`
//! database alias, the optional ledger-table override, and per-blueprint
//! database overrides that fall back to the global map.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blueprints::BlueprintConfig;
use crate::error::{QuartzError, QuartzResult};

/// The fixed MySQL port used for every connection.
pub const MYSQL_PORT: u16 = 3306;

/// Connection parameters for one logical database.
///
/// A database folder inside a blueprint's `migrations/` directory maps to
/// exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// The database name.
    pub name: String,
    /// The database user.
    #[serde(default)]
    pub user: String,
    /// The database password.
    #[serde(default)]
    pub password: String,
}

impl DatabaseSettings {
    /// Creates settings for a database reachable as `user` with `password`.
    pub fn new(
        name: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            user: user.into(),
            password: password.into(),
        }
    }
}

/// The complete set of project settings.
///
/// Mirrors the settings module of a blueprint-structured web project: a
/// global `databases` map keyed by database folder, a `default_database`
/// alias naming one of those folders, and optional per-blueprint overrides.
///
/// # Examples
///
/// ```
/// use quartz_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.debug);
/// assert!(settings.databases.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,
    /// Names of the installed blueprints, in registration order.
    pub installed_blueprints: Vec<String>,
    /// Database configurations, keyed by database folder (e.g. "common").
    pub databases: HashMap<String, DatabaseSettings>,
    /// The folder alias designated as the default database.
    pub default_database: Option<String>,
    /// Where the applied-migrations ledger lives. Falls back to the
    /// default database when unset.
    pub migrations_table: Option<DatabaseSettings>,
    /// Per-blueprint database maps overriding [`Settings::databases`].
    pub blueprint_databases: HashMap<String, HashMap<String, DatabaseSettings>>,
}

impl Settings {
    /// Returns the database map a blueprint should use.
    ///
    /// A blueprint declaring its own databases gets those; every other
    /// blueprint falls back to the global map.
    pub fn databases_for<'a>(
        &'a self,
        blueprint: &'a dyn BlueprintConfig,
    ) -> &'a HashMap<String, DatabaseSettings> {
        blueprint.database_settings().unwrap_or(&self.databases)
    }

    /// Resolves the database holding the applied-migrations ledger.
    ///
    /// Uses `migrations_table` when set, otherwise the database named by the
    /// `default_database` alias. A missing or dangling alias is a fatal
    /// configuration error: `migrate` must not touch any blueprint without a
    /// place to record what it applied.
    pub fn ledger_database(&self) -> QuartzResult<&DatabaseSettings> {
        if let Some(info) = &self.migrations_table {
            return Ok(info);
        }
        let alias = self.default_database.as_deref().ok_or_else(|| {
            QuartzError::ConfigurationError(
                "Database to save migrations is not specified. Set 'migrations_table' \
                 or a 'default_database' alias in the project settings"
                    .into(),
            )
        })?;
        self.databases.get(alias).ok_or_else(|| {
            QuartzError::ImproperlyConfigured(format!(
                "default_database '{alias}' does not name an entry in 'databases'"
            ))
        })
    }

    /// Parses settings from a TOML document.
    pub fn from_toml_str(content: &str) -> QuartzResult<Self> {
        toml::from_str(content)
            .map_err(|e| QuartzError::ImproperlyConfigured(format!("Invalid settings TOML: {e}")))
    }

    /// Loads settings from a TOML file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> QuartzResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
