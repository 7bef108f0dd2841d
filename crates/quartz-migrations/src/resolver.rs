//! Dependency resolution.
//!
//! For one migration file, the resolver walks every table, index and
//! trigger reference the extractor found and asks the creation registry
//! which earlier-scanned migration creates that object. Each resolved
//! reference becomes a dependency; each unresolved one becomes a warning.
//! Warnings never abort compilation, the dependency is simply omitted.
//!
//! When several creations share an object name, candidates are filtered by
//! database name, owning table, blueprint and required columns, and the
//! first surviving candidate in scan order wins. That first-match tie-break
//! is deliberate; picking the most recent instead would silently change
//! which migration existing projects depend on.

use crate::extract;
use crate::reference::MigrationRef;
use crate::registry::{Creation, CreationRegistry};

/// The outcome of resolving one migration's references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved dependencies, deduplicated, in discovery order.
    pub dependencies: Vec<MigrationRef>,
    /// One message per reference that matched no creation record.
    pub warnings: Vec<String>,
}

/// What a reference requires of a candidate creation record.
struct Criteria<'a> {
    db_name: &'a str,
    table: Option<&'a str>,
    blueprint: Option<&'a str>,
    columns: &'a [String],
}

impl Criteria<'_> {
    fn matches(&self, creation: &Creation) -> bool {
        creation.db_name == self.db_name
            && self
                .blueprint
                .map_or(true, |bp| creation.migration.blueprint == bp)
            && self
                .table
                .map_or(true, |t| creation.table.as_deref() == Some(t))
            && creation.has_columns(self.columns)
    }
}

/// Resolves one migration's references against a fully scanned registry.
pub struct Resolver<'a> {
    registry: &'a CreationRegistry,
}

impl<'a> Resolver<'a> {
    pub const fn new(registry: &'a CreationRegistry) -> Self {
        Self { registry }
    }

    /// Resolves every reference in one normalized migration file.
    ///
    /// `db_name` is the database (from settings) the migration's folder
    /// maps to; foreign keys may override it with an explicit qualifier.
    pub fn resolve(
        &self,
        reference: &MigrationRef,
        db_name: &str,
        normalized: &str,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        self.resolve_foreign_keys(reference, db_name, normalized, &mut resolution);
        self.resolve_alter_tables(reference, db_name, normalized, &mut resolution);
        self.resolve_created_indexes(reference, db_name, &mut resolution);
        self.resolve_created_triggers(reference, db_name, &mut resolution);
        self.resolve_dropped_triggers(reference, db_name, normalized, &mut resolution);
        resolution
    }

    /// Foreign-key targets resolve against table creations with the
    /// referenced column required. No blueprint filter: a foreign key may
    /// legitimately cross blueprints.
    fn resolve_foreign_keys(
        &self,
        reference: &MigrationRef,
        db_name: &str,
        normalized: &str,
        resolution: &mut Resolution,
    ) {
        for fk in extract::foreign_keys(normalized) {
            let target_db = fk.database.as_deref().unwrap_or(db_name);
            let warning = format!(
                "Related table \"{}.{}\" of foreign key \"{}\" is not created in any migration",
                target_db,
                fk.table,
                fk.display_name()
            );
            let columns = vec![fk.column.clone()];
            Self::search(
                self.registry.table_creations(&fk.table),
                &Criteria {
                    db_name: target_db,
                    table: None,
                    blueprint: None,
                    columns: &columns,
                },
                reference,
                warning,
                resolution,
            );
        }
    }

    fn resolve_alter_tables(
        &self,
        reference: &MigrationRef,
        db_name: &str,
        normalized: &str,
        resolution: &mut Resolution,
    ) {
        for alter in extract::alter_tables(normalized) {
            if !self.registry.knows_table(&alter.table) {
                resolution.warnings.push(format!(
                    "Altering table \"{}\" is not created in any migration",
                    alter.table
                ));
                continue;
            }
            let warning = format!(
                "Altering table \"{}\" with columns ({}) is not created in any migration",
                alter.table,
                alter.columns.join(", ")
            );
            Self::search(
                self.registry.table_creations(&alter.table),
                &Criteria {
                    db_name,
                    table: None,
                    blueprint: Some(&reference.blueprint),
                    columns: &alter.columns,
                },
                reference,
                warning,
                resolution,
            );
            for index in &alter.indexes {
                let warning = format!(
                    "Altering table \"{}\" with indexes ({}) is not created in any migration",
                    alter.table,
                    alter.indexes.join(", ")
                );
                Self::search(
                    self.registry.index_creations(index),
                    &Criteria {
                        db_name,
                        table: Some(&alter.table),
                        blueprint: Some(&reference.blueprint),
                        columns: &[],
                    },
                    reference,
                    warning,
                    resolution,
                );
            }
        }
    }

    /// Indexes this migration creates depend on the migration creating the
    /// indexed table with the indexed columns.
    fn resolve_created_indexes(
        &self,
        reference: &MigrationRef,
        db_name: &str,
        resolution: &mut Resolution,
    ) {
        let Some(creations) = self.registry.migration_creations(reference) else {
            return;
        };
        for index in &creations.indexes {
            if !self.registry.knows_table(&index.table) {
                resolution.warnings.push(format!(
                    "Indexing table \"{}\" is not created in any migration",
                    index.table
                ));
                continue;
            }
            let warning = format!(
                "Table \"{}\" with columns ({}) to indexing is not created in any migration",
                index.table,
                index.columns.join(", ")
            );
            Self::search(
                self.registry.table_creations(&index.table),
                &Criteria {
                    db_name,
                    table: None,
                    blueprint: Some(&reference.blueprint),
                    columns: &index.columns,
                },
                reference,
                warning,
                resolution,
            );
        }
    }

    /// Triggers this migration creates depend on the migration creating
    /// the table they fire on. No column requirement.
    fn resolve_created_triggers(
        &self,
        reference: &MigrationRef,
        db_name: &str,
        resolution: &mut Resolution,
    ) {
        let Some(creations) = self.registry.migration_creations(reference) else {
            return;
        };
        for trigger in &creations.triggers {
            if !self.registry.knows_table(&trigger.table) {
                resolution.warnings.push(format!(
                    "Table \"{}\" inside \"{}\" trigger is not created in any migration",
                    trigger.table, trigger.name
                ));
                continue;
            }
            let warning = format!(
                "Trigger \"{}\" on table \"{}\" is not created in any migration",
                trigger.name, trigger.table
            );
            Self::search(
                self.registry.table_creations(&trigger.table),
                &Criteria {
                    db_name,
                    table: None,
                    blueprint: Some(&reference.blueprint),
                    columns: &[],
                },
                reference,
                warning,
                resolution,
            );
        }
    }

    fn resolve_dropped_triggers(
        &self,
        reference: &MigrationRef,
        db_name: &str,
        normalized: &str,
        resolution: &mut Resolution,
    ) {
        for trigger in extract::trigger_drops(normalized) {
            let warning =
                format!("Trigger \"{trigger}\" is not created in any migration");
            if !self.registry.knows_trigger(&trigger) {
                resolution.warnings.push(warning);
                continue;
            }
            Self::search(
                self.registry.trigger_creations(&trigger),
                &Criteria {
                    db_name,
                    table: None,
                    blueprint: Some(&reference.blueprint),
                    columns: &[],
                },
                reference,
                warning,
                resolution,
            );
        }
    }

    /// Records the first candidate matching the criteria as a dependency,
    /// or the warning if none does.
    ///
    /// A reference resolving to the migration being compiled is already
    /// satisfied by that file's own statements; it contributes neither a
    /// dependency nor a warning.
    fn search(
        candidates: Option<&[Creation]>,
        criteria: &Criteria<'_>,
        current: &MigrationRef,
        warning: String,
        resolution: &mut Resolution,
    ) {
        let found = candidates
            .unwrap_or_default()
            .iter()
            .find(|creation| criteria.matches(creation));
        match found {
            Some(creation) if creation.migration == *current => {}
            Some(creation) => {
                if !resolution.dependencies.contains(&creation.migration) {
                    resolution.dependencies.push(creation.migration.clone());
                }
            }
            None => resolution.warnings.push(warning),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::normalize;

    fn scan(registry: &mut CreationRegistry, reference: &MigrationRef, db: &str, sql: &str) {
        registry.scan(reference, db, &normalize(sql));
    }

    fn resolve(
        registry: &CreationRegistry,
        reference: &MigrationRef,
        db: &str,
        sql: &str,
    ) -> Resolution {
        Resolver::new(registry).resolve(reference, db, &normalize(sql))
    }

    #[test]
    fn test_foreign_key_resolves_to_creating_migration() {
        let mut registry = CreationRegistry::new();
        let users = MigrationRef::new("game", "common", "0001_users");
        scan(&mut registry, &users, "words_game", "create table u (id int);");

        let scores = MigrationRef::new("game", "common", "0002_scores");
        let sql = "create table t (id int, a int, foreign key (a) references u (id));";
        scan(&mut registry, &scores, "words_game", sql);

        let resolution = resolve(&registry, &scores, "words_game", sql);
        assert_eq!(resolution.dependencies, vec![users]);
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_foreign_key_to_unknown_table_warns() {
        let registry = CreationRegistry::new();
        let scores = MigrationRef::new("game", "common", "0002_scores");
        let resolution = resolve(
            &registry,
            &scores,
            "words_game",
            "create table t (a int, foreign key (a) references u (id));",
        );
        assert!(resolution.dependencies.is_empty());
        assert_eq!(
            resolution.warnings,
            vec![
                "Related table \"words_game.u\" of foreign key \"(a)\" is not created in any \
                 migration"
            ]
        );
    }

    #[test]
    fn test_foreign_key_requires_referenced_column() {
        let mut registry = CreationRegistry::new();
        let users = MigrationRef::new("game", "common", "0001_users");
        scan(&mut registry, &users, "words_game", "create table u (pk int);");

        let scores = MigrationRef::new("game", "common", "0002_scores");
        let resolution = resolve(
            &registry,
            &scores,
            "words_game",
            "create table t (a int, foreign key (a) references u (id));",
        );
        assert!(resolution.dependencies.is_empty());
        assert_eq!(resolution.warnings.len(), 1);
    }

    #[test]
    fn test_foreign_key_db_qualifier_disambiguates() {
        let mut registry = CreationRegistry::new();
        let ours = MigrationRef::new("game", "common", "0001_u");
        scan(&mut registry, &ours, "words_game", "create table u (id int);");
        let theirs = MigrationRef::new("auth", "main", "0001_u");
        scan(&mut registry, &theirs, "auth_db", "create table u (id int);");

        let scores = MigrationRef::new("game", "common", "0002_scores");
        let resolution = resolve(
            &registry,
            &scores,
            "words_game",
            "create table t (a int, foreign key (a) references auth_db.u (id));",
        );
        assert_eq!(resolution.dependencies, vec![theirs]);
    }

    #[test]
    fn test_first_match_in_scan_order_wins() {
        let mut registry = CreationRegistry::new();
        let first = MigrationRef::new("game", "common", "0001_first");
        let second = MigrationRef::new("game", "common", "0002_second");
        scan(&mut registry, &first, "words_game", "create table u (id int);");
        scan(&mut registry, &second, "words_game", "create table u (id int);");

        let scores = MigrationRef::new("game", "common", "0003_scores");
        let resolution = resolve(
            &registry,
            &scores,
            "words_game",
            "create table t (a int, foreign key (a) references u (id));",
        );
        assert_eq!(resolution.dependencies, vec![first]);
    }

    #[test]
    fn test_same_file_reference_is_satisfied_silently() {
        let mut registry = CreationRegistry::new();
        let both = MigrationRef::new("game", "common", "0001_both");
        let sql = "create table u (id int); \
                   create table t (a int, foreign key (a) references u (id));";
        scan(&mut registry, &both, "words_game", sql);

        let resolution = resolve(&registry, &both, "words_game", sql);
        assert!(resolution.dependencies.is_empty());
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_alter_table_in_other_database_warns() {
        let mut registry = CreationRegistry::new();
        let other = MigrationRef::new("game", "other", "0001_t");
        scan(&mut registry, &other, "other_db", "create table t (id int, b int);");

        let alter = MigrationRef::new("game", "common", "0002_alter");
        let resolution = resolve(
            &registry,
            &alter,
            "words_game",
            "alter table t add column b int;",
        );
        assert!(resolution.dependencies.is_empty());
        assert_eq!(
            resolution.warnings,
            vec!["Altering table \"t\" with columns (b) is not created in any migration"]
        );
    }

    #[test]
    fn test_alter_unknown_table_short_warning() {
        let registry = CreationRegistry::new();
        let alter = MigrationRef::new("game", "common", "0002_alter");
        let resolution = resolve(
            &registry,
            &alter,
            "words_game",
            "alter table ghost add column b int;",
        );
        assert_eq!(
            resolution.warnings,
            vec!["Altering table \"ghost\" is not created in any migration"]
        );
    }

    #[test]
    fn test_blueprint_filter_keeps_resolution_local() {
        let mut registry = CreationRegistry::new();
        let foreign = MigrationRef::new("auth", "common", "0001_t");
        scan(&mut registry, &foreign, "words_game", "create table t (id int, b int);");

        let alter = MigrationRef::new("game", "common", "0002_alter");
        let resolution = resolve(
            &registry,
            &alter,
            "words_game",
            "alter table t add column b int;",
        );
        assert!(resolution.dependencies.is_empty());
        assert_eq!(resolution.warnings.len(), 1);
    }

    #[test]
    fn test_create_index_depends_on_table_creation() {
        let mut registry = CreationRegistry::new();
        let table = MigrationRef::new("game", "common", "0001_t");
        scan(&mut registry, &table, "words_game", "create table t (id int, a int);");

        let index = MigrationRef::new("game", "common", "0002_idx");
        let sql = "create index idx_a on t (a);";
        scan(&mut registry, &index, "words_game", sql);

        let resolution = resolve(&registry, &index, "words_game", sql);
        assert_eq!(resolution.dependencies, vec![table]);
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_create_index_on_missing_columns_warns() {
        let mut registry = CreationRegistry::new();
        let table = MigrationRef::new("game", "common", "0001_t");
        scan(&mut registry, &table, "words_game", "create table t (id int);");

        let index = MigrationRef::new("game", "common", "0002_idx");
        let sql = "create index idx_a on t (a);";
        scan(&mut registry, &index, "words_game", sql);

        let resolution = resolve(&registry, &index, "words_game", sql);
        assert!(resolution.dependencies.is_empty());
        assert_eq!(
            resolution.warnings,
            vec!["Table \"t\" with columns (a) to indexing is not created in any migration"]
        );
    }

    #[test]
    fn test_create_trigger_depends_on_table_creation() {
        let mut registry = CreationRegistry::new();
        let table = MigrationRef::new("game", "common", "0001_t");
        scan(&mut registry, &table, "words_game", "create table t (id int);");

        let trigger = MigrationRef::new("game", "common", "0002_trg");
        let sql = "create trigger trg after insert on t for each row set @x = 1;";
        scan(&mut registry, &trigger, "words_game", sql);

        let resolution = resolve(&registry, &trigger, "words_game", sql);
        assert_eq!(resolution.dependencies, vec![table]);
    }

    #[test]
    fn test_drop_trigger_depends_on_trigger_creation() {
        let mut registry = CreationRegistry::new();
        let table = MigrationRef::new("game", "common", "0001_t");
        scan(&mut registry, &table, "words_game", "create table t (id int);");
        let trigger = MigrationRef::new("game", "common", "0002_trg");
        scan(
            &mut registry,
            &trigger,
            "words_game",
            "create trigger trg after insert on t for each row set @x = 1;",
        );

        let drop = MigrationRef::new("game", "common", "0003_drop");
        let resolution = resolve(&registry, &drop, "words_game", "drop trigger trg;");
        assert_eq!(resolution.dependencies, vec![trigger]);
    }

    #[test]
    fn test_drop_unknown_trigger_warns() {
        let registry = CreationRegistry::new();
        let drop = MigrationRef::new("game", "common", "0003_drop");
        let resolution = resolve(&registry, &drop, "words_game", "drop trigger ghost;");
        assert_eq!(
            resolution.warnings,
            vec!["Trigger \"ghost\" is not created in any migration"]
        );
    }

    #[test]
    fn test_dependencies_deduplicated() {
        let mut registry = CreationRegistry::new();
        let users = MigrationRef::new("game", "common", "0001_users");
        scan(
            &mut registry,
            &users,
            "words_game",
            "create table u (id int); create table v (id int);",
        );

        let scores = MigrationRef::new("game", "common", "0002_scores");
        let resolution = resolve(
            &registry,
            &scores,
            "words_game",
            "create table t (a int, b int, \
             foreign key (a) references u (id), \
             foreign key (b) references v (id));",
        );
        assert_eq!(resolution.dependencies, vec![users]);
    }
}
