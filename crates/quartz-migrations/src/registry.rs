//! Creation registry.
//!
//! The compiler's first pass scans every migration file and records which
//! tables, indexes and triggers each one creates. The second pass queries
//! those records to resolve dependencies. Records keep insertion order,
//! which is the scan order; the resolver relies on that for its
//! first-match tie-break.

use std::collections::HashMap;

use crate::extract;
use crate::reference::MigrationRef;

/// One recorded creation of a database object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creation {
    /// The migration that creates the object.
    pub migration: MigrationRef,
    /// The database name (from settings) the migration's folder maps to.
    pub db_name: String,
    /// The owning table, for index and trigger creations.
    pub table: Option<String>,
    /// Column names. `Some` for tables and top-level indexes; `None` for
    /// inline indexes and triggers, whose columns are never known.
    pub columns: Option<Vec<String>>,
}

impl Creation {
    /// Whether this creation satisfies a column requirement.
    ///
    /// An empty requirement always passes, even when the candidate has no
    /// recorded columns. A non-empty requirement needs every required
    /// column present in the candidate's column list.
    pub fn has_columns(&self, required: &[String]) -> bool {
        if required.is_empty() {
            return true;
        }
        self.columns
            .as_ref()
            .is_some_and(|cols| required.iter().all(|c| cols.contains(c)))
    }
}

/// The indexes and triggers one migration file creates, kept so the
/// resolver can tie those creations back to the tables they sit on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationCreations {
    /// Top-level index creations with their column lists.
    pub indexes: Vec<extract::IndexCreation>,
    /// Trigger creations.
    pub triggers: Vec<extract::TriggerCreation>,
}

/// All creations observed across one compile run, indexed by object name.
#[derive(Debug, Default)]
pub struct CreationRegistry {
    tables: HashMap<String, Vec<Creation>>,
    indexes: HashMap<String, Vec<Creation>>,
    triggers: HashMap<String, Vec<Creation>>,
    per_migration: HashMap<MigrationRef, MigrationCreations>,
}

impl CreationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans one normalized migration file and records everything it
    /// creates.
    pub fn scan(&mut self, reference: &MigrationRef, db_name: &str, normalized: &str) {
        for table in extract::table_creations(normalized) {
            for index_name in &table.inline_indexes {
                // Inline index columns are not tracked.
                Self::record(
                    &mut self.indexes,
                    index_name,
                    reference,
                    db_name,
                    Some(table.name.clone()),
                    None,
                );
            }
            Self::record(
                &mut self.tables,
                &table.name,
                reference,
                db_name,
                None,
                Some(table.columns),
            );
        }

        for index in extract::index_creations(normalized) {
            Self::record(
                &mut self.indexes,
                &index.name,
                reference,
                db_name,
                Some(index.table.clone()),
                Some(index.columns.clone()),
            );
            self.per_migration
                .entry(reference.clone())
                .or_default()
                .indexes
                .push(index);
        }

        for trigger in extract::trigger_creations(normalized) {
            Self::record(
                &mut self.triggers,
                &trigger.name,
                reference,
                db_name,
                Some(trigger.table.clone()),
                None,
            );
            self.per_migration
                .entry(reference.clone())
                .or_default()
                .triggers
                .push(trigger);
        }
    }

    fn record(
        map: &mut HashMap<String, Vec<Creation>>,
        name: &str,
        reference: &MigrationRef,
        db_name: &str,
        table: Option<String>,
        columns: Option<Vec<String>>,
    ) {
        let creation = Creation {
            migration: reference.clone(),
            db_name: db_name.to_string(),
            table,
            columns,
        };
        map.entry(name.to_string()).or_default().push(creation);
    }

    /// Candidate creations for a table name, in scan order.
    pub fn table_creations(&self, name: &str) -> Option<&[Creation]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    /// Candidate creations for an index name, in scan order.
    pub fn index_creations(&self, name: &str) -> Option<&[Creation]> {
        self.indexes.get(name).map(Vec::as_slice)
    }

    /// Candidate creations for a trigger name, in scan order.
    pub fn trigger_creations(&self, name: &str) -> Option<&[Creation]> {
        self.triggers.get(name).map(Vec::as_slice)
    }

    /// Whether any migration creates a table with this name.
    pub fn knows_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Whether any migration creates a trigger with this name.
    pub fn knows_trigger(&self, name: &str) -> bool {
        self.triggers.contains_key(name)
    }

    /// The indexes and triggers a specific migration creates.
    pub fn migration_creations(&self, reference: &MigrationRef) -> Option<&MigrationCreations> {
        self.per_migration.get(reference)
    }
}
