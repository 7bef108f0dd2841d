//! # quartz-db
//!
//! Database access for quartz: the [`DatabaseBackend`] trait consumed by the
//! migration engine and a MySQL implementation over `mysql_async` pooling.
//!
//! The trait is intentionally small - execute a statement, run a query,
//! execute a raw multi-statement script - because the migration engine never
//! builds queries programmatically; it replays SQL text written by hand.

pub mod backend;
pub mod mysql;

pub use backend::{DatabaseBackend, Row, Value};
pub use mysql::MySqlBackend;
