//! Base database backend trait and common types.
//!
//! This module defines the [`DatabaseBackend`] trait implemented by every
//! driver, along with the small [`Value`] and [`Row`] types the migration
//! engine consumes. The engine only ever executes raw SQL text and reads
//! back string/integer columns, so the surface is deliberately narrow.

use quartz_core::QuartzError;

/// A database value, reduced to what the migration engine reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A text value.
    String(String),
    /// A raw byte value.
    Bytes(Vec<u8>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// A single result row with named columns.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from parallel column/value vectors.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Returns the value of the named column.
    pub fn get(&self, column: &str) -> Result<&Value, QuartzError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
            .ok_or_else(|| QuartzError::DatabaseError(format!("Missing '{column}' column")))
    }

    /// Returns the named column as a string.
    ///
    /// Integers are rendered with `to_string`; NULL and non-scalar values
    /// are an error.
    pub fn get_string(&self, column: &str) -> Result<String, QuartzError> {
        match self.get(column)? {
            Value::String(s) => Ok(s.clone()),
            Value::Int(i) => Ok(i.to_string()),
            other => Err(QuartzError::DatabaseError(format!(
                "Column '{column}' is not a string: {other:?}"
            ))),
        }
    }
}

/// The core trait for database backends.
///
/// All methods are async because database operations are I/O-bound; these
/// calls are exactly the engine's suspension points. Implementations must be
/// `Send + Sync` so a single backend can be shared across the apply walk.
#[async_trait::async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Returns the vendor name (e.g. "mysql").
    fn vendor(&self) -> &str;

    /// Executes a SQL statement that does not return rows.
    ///
    /// Returns the number of rows affected.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, QuartzError>;

    /// Executes a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, QuartzError>;

    /// Executes raw SQL text that may contain several statements.
    ///
    /// Migration files are executed verbatim through this method, matching
    /// how the source `.sql` files were authored.
    async fn execute_script(&self, sql: &str) -> Result<(), QuartzError>;

    /// Releases any held connections.
    ///
    /// Called once when the run that created this backend finishes.
    async fn close(&self) -> Result<(), QuartzError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_get() {
        let row = Row::new(
            vec!["blueprint".into(), "name".into()],
            vec![Value::from("game"), Value::from("0001_initial")],
        );
        assert_eq!(row.get("blueprint").unwrap(), &Value::from("game"));
        assert!(row.get("missing").is_err());
    }

    #[test]
    fn test_row_get_string_coerces_int() {
        let row = Row::new(vec!["id".into()], vec![Value::Int(7)]);
        assert_eq!(row.get_string("id").unwrap(), "7");
    }

    #[test]
    fn test_row_get_string_rejects_null() {
        let row = Row::new(vec!["applied".into()], vec![Value::Null]);
        assert!(row.get_string("applied").is_err());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from("x"), Value::String("x".into()));
        assert_eq!(Value::from(3_i64), Value::Int(3));
    }
}
