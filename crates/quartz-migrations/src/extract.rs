//! SQL statement extraction.
//!
//! Migration files are plain `.sql` text. This module normalizes that text
//! and pulls out the structural facts the dependency resolver needs: table
//! creations with their column lists, index and trigger creations,
//! alter-table column/index edits, foreign-key clauses, and trigger drops.
//!
//! This is pattern matching over normalized text, not a SQL grammar.
//! Multi-statement files are handled by collecting all non-overlapping
//! matches of each pattern. A statement no pattern recognizes simply
//! produces nothing, which can under-detect dependencies; that is a
//! documented limitation of the extraction approach. The functions are kept
//! free-standing so a real parser could replace them behind the same
//! signatures.

use once_cell::sync::Lazy;
use regex::Regex;

static OPEN_PAREN_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*").unwrap());
static QUOTE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["'`]"#).unwrap());
static ANY_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()]").unwrap());
static CLOSE_PAREN_SEMI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\)\s+;").unwrap());
static WS_CLOSE_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\)").unwrap());

static TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"create\s+table\s+(\S+)\s*\((.*?)\)\s*(?:;|$)").unwrap());
static KEY_CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[(,]?\s*(?:foreign|primary|unique\s+key)\s+\S*\s*\(.*\)").unwrap());
static INLINE_INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^,(]*\bindex\s+([a-z0-9_]+)\s*\(([^)]*)\),?").unwrap());
static INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"create\s+index\s+(\S+)\s+on\s+(\S+)\s+\(([^)]+)\)").unwrap());
static TRIGGER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"create\s+trigger\s+(?:if\s+not\s+exists\s+)?(\S+)\s+(?:before|after)\s+(?:create|insert|update|delete)\s+on\s+(\S+)",
    )
    .unwrap()
});
static ALTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"alter\s+table\s+([^\s;]+)\s+([^;]*)").unwrap());
static COLUMN_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+column\s+").unwrap());
static ALTER_INDEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bindex\s+([^\s,;]+)").unwrap());
static FK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"foreign\s+key\s+(?:([^\s(]+)\s+)?\(([^)]*)\)\s+references\s+([^\s(]+)\s*\(([^)]+)\)")
        .unwrap()
});
static DROP_TRIGGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"drop\s+trigger\s+([^\s;]+)").unwrap());
static COMMA_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*").unwrap());

/// A `create table` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCreation {
    /// The created table.
    pub name: String,
    /// Column names, excluding foreign/primary/unique key clauses.
    pub columns: Vec<String>,
    /// Names of indexes defined inline in the table body.
    pub inline_indexes: Vec<String>,
}

/// A top-level `create index` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCreation {
    /// The created index.
    pub name: String,
    /// The indexed table.
    pub table: String,
    /// The indexed columns.
    pub columns: Vec<String>,
}

/// A `create trigger` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerCreation {
    /// The created trigger.
    pub name: String,
    /// The table the trigger fires on.
    pub table: String,
}

/// An `alter table` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterTable {
    /// The altered table.
    pub table: String,
    /// Columns being added or modified. Alter parts without a `column`
    /// keyword contribute nothing here.
    pub columns: Vec<String>,
    /// Indexes being added or modified.
    pub indexes: Vec<String>,
}

/// A foreign-key clause inside a table creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// The constraint name, when one was written between `key` and the
    /// column list.
    pub constraint: Option<String>,
    /// The local columns, as written.
    pub local_columns: String,
    /// The referenced table (unqualified).
    pub table: String,
    /// The database qualifying the referenced table, if any.
    pub database: Option<String>,
    /// The referenced column.
    pub column: String,
}

impl ForeignKey {
    /// A human-readable handle for warnings: the constraint name when
    /// present, otherwise the parenthesized local column list.
    pub fn display_name(&self) -> String {
        self.constraint
            .clone()
            .unwrap_or_else(|| format!("({})", self.local_columns))
    }
}

/// Normalizes raw migration text for pattern matching.
///
/// Lower-cases, removes newlines, strips quoting characters, and collapses
/// whitespace around parentheses into one canonical form: a space before
/// every `(`, none inside either paren, and `;` immediately after a closing
/// paren.
pub fn normalize(sql: &str) -> String {
    let text = sql.to_lowercase().replace('\n', "");
    let text = OPEN_PAREN_WS.replace_all(&text, "(");
    let text = QUOTE_CHARS.replace_all(&text, "");
    let text = ANY_PAREN.replace_all(&text, |caps: &regex::Captures<'_>| {
        if &caps[0] == "(" {
            " (".to_string()
        } else {
            ") ".to_string()
        }
    });
    let text = CLOSE_PAREN_SEMI.replace_all(&text, ");");
    WS_CLOSE_PAREN.replace_all(&text, ")").into_owned()
}

fn split_list(list: &str) -> Vec<String> {
    COMMA_WS
        .split(list)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Extracts every `create table` statement from normalized text.
pub fn table_creations(normalized: &str) -> Vec<TableCreation> {
    TABLE_RE
        .captures_iter(normalized)
        .map(|caps| {
            let name = caps[1].to_string();
            let body = &caps[2];

            // Key clauses are not columns.
            let without_keys = KEY_CLAUSE_RE.replace_all(body, "");

            let inline_indexes: Vec<String> = INLINE_INDEX_RE
                .captures_iter(&without_keys)
                .map(|idx| idx[1].to_string())
                .collect();
            let without_indexes = INLINE_INDEX_RE.replace_all(&without_keys, "");

            let columns = split_list(&without_indexes)
                .iter()
                .filter_map(|def| def.split_whitespace().next().map(ToString::to_string))
                .collect();

            TableCreation {
                name,
                columns,
                inline_indexes,
            }
        })
        .collect()
}

/// Extracts every top-level `create index` statement.
pub fn index_creations(normalized: &str) -> Vec<IndexCreation> {
    INDEX_RE
        .captures_iter(normalized)
        .map(|caps| IndexCreation {
            name: caps[1].to_string(),
            table: caps[2].to_string(),
            columns: split_list(&caps[3]),
        })
        .collect()
}

/// Extracts every `create trigger` statement.
///
/// An optional `if not exists` between `trigger` and the name is accepted;
/// it shifts the name and table token positions.
pub fn trigger_creations(normalized: &str) -> Vec<TriggerCreation> {
    TRIGGER_RE
        .captures_iter(normalized)
        .map(|caps| TriggerCreation {
            name: caps[1].to_string(),
            table: caps[2].to_string(),
        })
        .collect()
}

/// Extracts every `alter table` statement.
pub fn alter_tables(normalized: &str) -> Vec<AlterTable> {
    ALTER_RE
        .captures_iter(normalized)
        .map(|caps| {
            let table = caps[1].to_string();
            let body = &caps[2];

            let columns = split_list(body)
                .iter()
                .filter(|part| part.contains("column"))
                .filter_map(|part| {
                    COLUMN_SPLIT_RE
                        .split(part)
                        .last()
                        .and_then(|rest| rest.split_whitespace().next())
                        .map(ToString::to_string)
                })
                .collect();

            let indexes = ALTER_INDEX_RE
                .captures_iter(body)
                .map(|idx| idx[1].to_string())
                .collect();

            AlterTable {
                table,
                columns,
                indexes,
            }
        })
        .collect()
}

/// Extracts every foreign-key clause.
///
/// The referenced table may be qualified with a database name
/// (`other_db.users`), in which case the qualifier is split off.
pub fn foreign_keys(normalized: &str) -> Vec<ForeignKey> {
    FK_RE
        .captures_iter(normalized)
        .map(|caps| {
            let constraint = caps.get(1).map(|m| m.as_str().to_string());
            let local_columns = caps[2].to_string();
            let referenced = &caps[3];
            let column = caps[4].trim().to_string();

            let (database, table) = match referenced.split_once('.') {
                Some((db, table)) => (Some(db.to_string()), table.to_string()),
                None => (None, referenced.to_string()),
            };

            ForeignKey {
                constraint,
                local_columns,
                table,
                database,
                column,
            }
        })
        .collect()
}

/// Extracts the names of dropped triggers.
pub fn trigger_drops(normalized: &str) -> Vec<String> {
    DROP_TRIGGER_RE
        .captures_iter(normalized)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_parens_and_quotes() {
        let normalized = normalize("CREATE TABLE `user` (\n  id INT,\n  name VARCHAR( 100 )\n) ;");
        assert_eq!(normalized, "create table user  (id int,  name varchar (100));");
    }

    #[test]
    fn test_normalize_strips_all_quote_kinds() {
        let normalized = normalize(r#"INSERT INTO "t" VALUES ('x')"#);
        assert!(!normalized.contains('"'));
        assert!(!normalized.contains('\''));
    }

    #[test]
    fn test_table_creation_simple() {
        let normalized = normalize("create table u (id int primary key auto_increment, name varchar(50));");
        let tables = table_creations(&normalized);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "u");
        assert_eq!(tables[0].columns, vec!["id", "name"]);
        assert!(tables[0].inline_indexes.is_empty());
    }

    #[test]
    fn test_table_creation_excludes_key_clauses() {
        let normalized = normalize(
            "create table t (id int, a int, foreign key (a) references u (id));",
        );
        let tables = table_creations(&normalized);
        assert_eq!(tables[0].columns, vec!["id", "a"]);
    }

    #[test]
    fn test_table_creation_inline_index() {
        let normalized =
            normalize("create table t (id int, a int, unique index idx_a (a));");
        let tables = table_creations(&normalized);
        assert_eq!(tables[0].columns, vec!["id", "a"]);
        assert_eq!(tables[0].inline_indexes, vec!["idx_a"]);
    }

    #[test]
    fn test_table_creation_multi_statement() {
        let sql = "create table a (id int); create table b (id int, x int);";
        let tables = table_creations(&normalize(sql));
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "a");
        assert_eq!(tables[1].name, "b");
        assert_eq!(tables[1].columns, vec!["id", "x"]);
    }

    #[test]
    fn test_table_creation_without_trailing_semicolon() {
        let tables = table_creations(&normalize("create table a (id int)"));
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].columns, vec!["id"]);
    }

    #[test]
    fn test_index_creation() {
        let normalized = normalize("CREATE INDEX idx_name ON user (first_name, last_name);");
        let indexes = index_creations(&normalized);
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].name, "idx_name");
        assert_eq!(indexes[0].table, "user");
        assert_eq!(indexes[0].columns, vec!["first_name", "last_name"]);
    }

    #[test]
    fn test_trigger_creation() {
        let normalized = normalize(
            "CREATE TRIGGER audit_t BEFORE UPDATE ON user FOR EACH ROW SET NEW.x = 1;",
        );
        let triggers = trigger_creations(&normalized);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].name, "audit_t");
        assert_eq!(triggers[0].table, "user");
    }

    #[test]
    fn test_trigger_creation_if_not_exists_shifts_tokens() {
        let normalized = normalize(
            "create trigger if not exists audit_t after delete on user for each row set @x = 1;",
        );
        let triggers = trigger_creations(&normalized);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].name, "audit_t");
        assert_eq!(triggers[0].table, "user");
    }

    #[test]
    fn test_alter_table_columns() {
        let normalized = normalize("alter table t add column b int, modify column c varchar(10);");
        let alters = alter_tables(&normalized);
        assert_eq!(alters.len(), 1);
        assert_eq!(alters[0].table, "t");
        assert_eq!(alters[0].columns, vec!["b", "c"]);
        assert!(alters[0].indexes.is_empty());
    }

    #[test]
    fn test_alter_table_without_column_keyword_tracks_nothing() {
        let normalized = normalize("alter table t add constraint ck check (x > 0);");
        let alters = alter_tables(&normalized);
        assert_eq!(alters.len(), 1);
        assert!(alters[0].columns.is_empty());
    }

    #[test]
    fn test_alter_table_indexes() {
        let normalized = normalize("alter table t add index idx_b (b), add column b int;");
        let alters = alter_tables(&normalized);
        assert_eq!(alters[0].indexes, vec!["idx_b"]);
        assert_eq!(alters[0].columns, vec!["b"]);
    }

    #[test]
    fn test_alter_table_stops_at_semicolon() {
        let sql = "alter table t add column b int; alter table u add column c int;";
        let alters = alter_tables(&normalize(sql));
        assert_eq!(alters.len(), 2);
        assert_eq!(alters[0].table, "t");
        assert_eq!(alters[1].table, "u");
    }

    #[test]
    fn test_foreign_key_unnamed() {
        let normalized =
            normalize("create table t (a int, foreign key (a) references u (id));");
        let fks = foreign_keys(&normalized);
        assert_eq!(fks.len(), 1);
        assert!(fks[0].constraint.is_none());
        assert_eq!(fks[0].table, "u");
        assert_eq!(fks[0].column, "id");
        assert!(fks[0].database.is_none());
        assert_eq!(fks[0].display_name(), "(a)");
    }

    #[test]
    fn test_foreign_key_named() {
        let normalized =
            normalize("create table t (a int, foreign key fk_a (a) references u (id));");
        let fks = foreign_keys(&normalized);
        assert_eq!(fks[0].constraint.as_deref(), Some("fk_a"));
        assert_eq!(fks[0].display_name(), "fk_a");
    }

    #[test]
    fn test_foreign_key_database_qualified() {
        let normalized = normalize(
            "create table t (a int, foreign key (a) references other_db.u (id));",
        );
        let fks = foreign_keys(&normalized);
        assert_eq!(fks[0].database.as_deref(), Some("other_db"));
        assert_eq!(fks[0].table, "u");
    }

    #[test]
    fn test_multiple_foreign_keys() {
        let normalized = normalize(
            "create table t (a int, b int, \
             foreign key (a) references u (id), \
             foreign key (b) references v (id));",
        );
        let fks = foreign_keys(&normalized);
        assert_eq!(fks.len(), 2);
        assert_eq!(fks[0].table, "u");
        assert_eq!(fks[1].table, "v");
    }

    #[test]
    fn test_trigger_drop() {
        let drops = trigger_drops(&normalize("DROP TRIGGER audit_t;"));
        assert_eq!(drops, vec!["audit_t"]);
    }

    #[test]
    fn test_unclassifiable_statement_produces_nothing() {
        let normalized = normalize("insert into t (a) values (1);");
        assert!(table_creations(&normalized).is_empty());
        assert!(index_creations(&normalized).is_empty());
        assert!(trigger_creations(&normalized).is_empty());
        assert!(alter_tables(&normalized).is_empty());
        assert!(foreign_keys(&normalized).is_empty());
        assert!(trigger_drops(&normalized).is_empty());
    }
}
