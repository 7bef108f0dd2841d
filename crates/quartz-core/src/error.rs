//! Core error types for the quartz migration engine.
//!
//! This module provides the [`QuartzError`] enum covering configuration
//! errors, database errors, ledger conflicts, and dependency-graph errors,
//! together with the [`QuartzResult`] alias used throughout the workspace.

use thiserror::Error;

/// The primary error type for the quartz workspace.
///
/// Variants map onto the engine's error taxonomy:
///
/// - `ConfigurationError` / `ImproperlyConfigured` are fatal to a whole
///   `migrate` run and abort it before any blueprint is touched.
/// - `IntegrityError` covers ledger write conflicts (a duplicate
///   applied-migration entry) and is fatal to the ledger-flush step only.
/// - `DatabaseError` covers failed migration SQL; a single migration is
///   marked failed and the run continues.
/// - `OperationalError` covers connection-level failures.
/// - `CyclicDependency` is raised when an apply walk revisits a migration
///   that is still in progress.
#[derive(Error, Debug)]
pub enum QuartzError {
    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The project settings are internally inconsistent.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// A SQL statement failed to execute.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A database uniqueness or integrity constraint was violated.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// An operational database error (connection failure, etc.).
    #[error("Operational error: {0}")]
    OperationalError(String),

    /// A migration dependency chain loops back onto itself.
    #[error("Cyclic dependency detected at migration '{0}'")]
    CyclicDependency(String),

    /// An error occurred while reading or writing a compiled artifact.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for QuartzError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl QuartzError {
    /// Returns `true` if this error must abort the whole run.
    ///
    /// Configuration problems are detected before any blueprint is touched
    /// and there is nothing sensible to continue with; everything else is
    /// reported per-operation.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError(_) | Self::ImproperlyConfigured(_)
        )
    }
}

/// A convenience type alias for `Result<T, QuartzError>`.
pub type QuartzResult<T> = Result<T, QuartzError>;
