//! Applied-migrations ledger.
//!
//! A single MySQL table records every migration ever applied, keyed
//! uniquely by (blueprint, db_name, name). The `db_name` column stores the
//! database *folder*, matching how migrations are addressed on disk, not
//! the database it maps to in settings.
//!
//! During a run the ledger buffers successful applications in memory and
//! writes them in one batched insert at the end. Schema changes are never
//! rolled back: if the flush fails, the migrations stay applied in their
//! databases and only the bookkeeping is lost.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use quartz_core::{QuartzError, QuartzResult};
use quartz_db::{DatabaseBackend, Value};

use crate::reference::MigrationRef;

/// The ledger table name.
pub const LEDGER_TABLE: &str = "migrations";

const CREATE_LEDGER_TABLE: &str = "CREATE TABLE IF NOT EXISTS migrations (\
     id INT NOT NULL AUTO_INCREMENT PRIMARY KEY, \
     blueprint VARCHAR(100) NOT NULL, \
     db_name VARCHAR(100) NOT NULL, \
     name VARCHAR(150) NOT NULL, \
     applied DATETIME NULL DEFAULT CURRENT_TIMESTAMP, \
     UNIQUE (blueprint, db_name, name))";

struct LedgerEntry {
    reference: MigrationRef,
    applied: String,
}

/// The applied-migrations ledger over one database backend.
pub struct Ledger {
    backend: Arc<dyn DatabaseBackend>,
    pending: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(backend: Arc<dyn DatabaseBackend>) -> Self {
        Self {
            backend,
            pending: Vec::new(),
        }
    }

    /// Creates the ledger table when it does not exist yet.
    pub async fn ensure_table(&self) -> QuartzResult<()> {
        self.backend.execute(CREATE_LEDGER_TABLE, &[]).await?;
        debug!(table = LEDGER_TABLE, "ledger table ready");
        Ok(())
    }

    /// Loads every previously applied migration.
    pub async fn load(&self) -> QuartzResult<HashSet<MigrationRef>> {
        let rows = self
            .backend
            .query(
                "SELECT blueprint, db_name, name FROM migrations",
                &[],
            )
            .await?;
        let mut applied = HashSet::with_capacity(rows.len());
        for row in &rows {
            applied.insert(MigrationRef::new(
                row.get_string("blueprint")?,
                row.get_string("db_name")?,
                row.get_string("name")?,
            ));
        }
        debug!(count = applied.len(), "loaded applied migrations");
        Ok(applied)
    }

    /// Buffers one successful application for the next [`flush`].
    ///
    /// [`flush`]: Self::flush
    pub fn record(&mut self, reference: &MigrationRef) {
        self.pending.push(LedgerEntry {
            reference: reference.clone(),
            applied: Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
        });
    }

    /// Number of buffered, not yet flushed entries.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Writes all buffered entries in one batched insert.
    ///
    /// Returns the number of entries written. A uniqueness violation means
    /// some migration was recorded twice and surfaces as
    /// [`QuartzError::IntegrityError`]; the applied schema changes are not
    /// affected, only the bookkeeping write fails.
    pub async fn flush(&mut self) -> QuartzResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let placeholders: Vec<&str> = self.pending.iter().map(|_| "(?, ?, ?, ?)").collect();
        let sql = format!(
            "INSERT INTO migrations (blueprint, db_name, name, applied) VALUES {}",
            placeholders.join(", ")
        );
        let params: Vec<Value> = self
            .pending
            .iter()
            .flat_map(|entry| {
                vec![
                    Value::String(entry.reference.blueprint.clone()),
                    Value::String(entry.reference.db_folder.clone()),
                    Value::String(entry.reference.name.clone()),
                    Value::String(entry.applied.clone()),
                ]
            })
            .collect();

        match self.backend.execute(&sql, &params).await {
            Ok(_) => {
                let written = self.pending.len();
                self.pending.clear();
                info!(count = written, "ledger flushed");
                Ok(written)
            }
            Err(QuartzError::DatabaseError(msg)) if msg.contains("Duplicate entry") => {
                Err(QuartzError::IntegrityError(format!(
                    "A migration is already recorded in the ledger: {msg}"
                )))
            }
            Err(err) => Err(err),
        }
    }
}
