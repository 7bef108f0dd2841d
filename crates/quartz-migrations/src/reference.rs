//! Migration references.
//!
//! A migration is identified by the triple (blueprint, database folder,
//! migration name), serialized as the path-like string
//! `blueprint/db_folder/name`. Compiled artifacts store their dependencies
//! in this form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use quartz_core::QuartzError;

/// Uniquely identifies one migration.
///
/// The `name` never carries a file extension; it is the stem shared by the
/// `.sql` source and its compiled artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MigrationRef {
    /// The owning blueprint.
    pub blueprint: String,
    /// The database folder inside the blueprint's migrations directory.
    pub db_folder: String,
    /// The migration name (filename without extension).
    pub name: String,
}

impl MigrationRef {
    /// Creates a reference from its three parts.
    pub fn new(
        blueprint: impl Into<String>,
        db_folder: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            blueprint: blueprint.into(),
            db_folder: db_folder.into(),
            name: name.into(),
        }
    }

    /// Returns the `blueprint/db_folder` pair keying the connection pool
    /// this migration executes against.
    pub fn pool_key(&self) -> String {
        format!("{}/{}", self.blueprint, self.db_folder)
    }
}

impl fmt::Display for MigrationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.blueprint, self.db_folder, self.name)
    }
}

impl FromStr for MigrationRef {
    type Err = QuartzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(blueprint), Some(db_folder), Some(name))
                if !blueprint.is_empty() && !db_folder.is_empty() && !name.is_empty() =>
            {
                Ok(Self::new(blueprint, db_folder, name))
            }
            _ => Err(QuartzError::SerializationError(format!(
                "Invalid migration reference '{s}': expected blueprint/db_folder/name"
            ))),
        }
    }
}

impl Serialize for MigrationRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MigrationRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let reference = MigrationRef::new("game", "common", "0001_initial");
        let s = reference.to_string();
        assert_eq!(s, "game/common/0001_initial");
        assert_eq!(s.parse::<MigrationRef>().unwrap(), reference);
    }

    #[test]
    fn test_name_may_contain_slash_free_text() {
        let reference: MigrationRef = "game/common/add_users_table".parse().unwrap();
        assert_eq!(reference.name, "add_users_table");
        assert_eq!(reference.pool_key(), "game/common");
    }

    #[test]
    fn test_parse_rejects_short_paths() {
        assert!("game/common".parse::<MigrationRef>().is_err());
        assert!("".parse::<MigrationRef>().is_err());
        assert!("a//b".parse::<MigrationRef>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let reference = MigrationRef::new("game", "common", "0001_initial");
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(json, "\"game/common/0001_initial\"");
        let back: MigrationRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reference);
    }
}
