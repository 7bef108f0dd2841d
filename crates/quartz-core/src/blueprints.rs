//! Blueprint registry for quartz.
//!
//! A *blueprint* is an independently-versioned application module owning its
//! own migration history and, possibly, its own databases. The migration
//! engine sees the surrounding web application only through this narrow
//! interface: enumerate the registered blueprints, their migration
//! directories, and their declared database folders.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{QuartzError, QuartzResult};
use crate::settings::{DatabaseSettings, Settings};

/// Configuration for one installed blueprint.
///
/// Implement this for each application module that carries migrations.
///
/// # Examples
///
/// ```
/// use quartz_core::blueprints::BlueprintConfig;
///
/// struct GameBlueprint;
///
/// impl BlueprintConfig for GameBlueprint {
///     fn name(&self) -> &str { "game" }
/// }
///
/// assert_eq!(GameBlueprint.migrations_dir(), std::path::PathBuf::from("game/migrations"));
/// ```
pub trait BlueprintConfig: Send + Sync {
    /// Returns the blueprint name (also its directory name).
    fn name(&self) -> &str;

    /// Returns the directory holding this blueprint's migration folders.
    fn migrations_dir(&self) -> PathBuf {
        PathBuf::from(self.name()).join("migrations")
    }

    /// Returns this blueprint's own database map, if it declares one.
    ///
    /// Returning `None` means the blueprint uses the project-wide databases.
    fn database_settings(&self) -> Option<&HashMap<String, DatabaseSettings>> {
        None
    }
}

/// A blueprint defined purely by project settings.
///
/// Built from `installed_blueprints`; carries the per-blueprint database
/// override from [`Settings::blueprint_databases`] when one exists.
pub struct SettingsBlueprint {
    name: String,
    databases: Option<HashMap<String, DatabaseSettings>>,
}

impl SettingsBlueprint {
    /// Creates a settings-backed blueprint.
    pub fn new(name: impl Into<String>, settings: &Settings) -> Self {
        let name = name.into();
        let databases = settings.blueprint_databases.get(&name).cloned();
        Self { name, databases }
    }
}

impl BlueprintConfig for SettingsBlueprint {
    fn name(&self) -> &str {
        &self.name
    }

    fn database_settings(&self) -> Option<&HashMap<String, DatabaseSettings>> {
        self.databases.as_ref()
    }
}

/// The registry of installed blueprints.
///
/// Blueprints are registered once at startup and are immutable for the run.
pub struct BlueprintRegistry {
    blueprints: Vec<Box<dyn BlueprintConfig>>,
    labels: HashMap<String, usize>,
}

impl std::fmt::Debug for BlueprintRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlueprintRegistry")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl Default for BlueprintRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlueprintRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            blueprints: Vec::new(),
            labels: HashMap::new(),
        }
    }

    /// Builds a registry holding one [`SettingsBlueprint`] per entry of
    /// `settings.installed_blueprints`.
    ///
    /// # Errors
    ///
    /// Returns [`QuartzError::ImproperlyConfigured`] when
    /// `installed_blueprints` lists the same name twice.
    pub fn from_settings(settings: &Settings) -> QuartzResult<Self> {
        let mut registry = Self::new();
        for name in &settings.installed_blueprints {
            registry.register(Box::new(SettingsBlueprint::new(name, settings)))?;
        }
        Ok(registry)
    }

    /// Registers a blueprint.
    ///
    /// # Errors
    ///
    /// Returns [`QuartzError::ImproperlyConfigured`] when a blueprint with
    /// the same name is already registered. Blueprint names come straight
    /// from project settings, so a clash is a configuration mistake to
    /// report, not a programming bug.
    pub fn register(&mut self, blueprint: Box<dyn BlueprintConfig>) -> QuartzResult<()> {
        let name = blueprint.name().to_string();
        if self.labels.contains_key(&name) {
            return Err(QuartzError::ImproperlyConfigured(format!(
                "Blueprint '{name}' is already registered"
            )));
        }
        let index = self.blueprints.len();
        self.labels.insert(name, index);
        self.blueprints.push(blueprint);
        Ok(())
    }

    /// Returns the blueprint with the given name, if registered.
    pub fn get(&self, name: &str) -> Option<&dyn BlueprintConfig> {
        self.labels.get(name).map(|&idx| self.blueprints[idx].as_ref())
    }

    /// Returns all registered blueprints in registration order.
    pub fn blueprints(&self) -> impl Iterator<Item = &dyn BlueprintConfig> {
        self.blueprints.iter().map(AsRef::as_ref)
    }

    /// Returns the number of registered blueprints.
    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Returns `true` if no blueprints are registered.
    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}
