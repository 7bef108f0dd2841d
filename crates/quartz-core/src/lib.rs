//! # quartz-core
//!
//! Core types shared across the quartz workspace:
//!
//! - **Settings** - project configuration: database maps keyed by database
//!   folder, the default-database alias, the ledger-table override, and
//!   per-blueprint overrides with global fallback
//! - **Blueprints** - the registry of installed application modules, each
//!   owning its own migration directories
//! - **Errors** - the [`QuartzError`] taxonomy used by every crate
//! - **Logging** - tracing-subscriber setup driven by settings

#![allow(clippy::missing_const_for_fn)]

pub mod blueprints;
pub mod error;
pub mod logging;
pub mod settings;

pub use blueprints::{BlueprintConfig, BlueprintRegistry, SettingsBlueprint};
pub use error::{QuartzError, QuartzResult};
pub use settings::{DatabaseSettings, Settings, MYSQL_PORT};
