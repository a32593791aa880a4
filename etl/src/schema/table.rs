use std::fmt;

use crate::canonical::CanonicalField;

/// CQL column types used by the target tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int,
    Text,
    Decimal,
}

impl ColumnType {
    /// Returns the CQL spelling of the type.
    pub fn as_cql(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Text => "text",
            ColumnType::Decimal => "decimal",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cql())
    }
}

/// A column of a target table and the canonical field it is projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: &'static str,
    pub typ: ColumnType,
    pub source: CanonicalField,
}

impl ColumnSchema {
    const fn new(name: &'static str, typ: ColumnType, source: CanonicalField) -> Self {
        Self { name, typ, source }
    }
}

/// Layout of one denormalized target table.
///
/// Columns are listed in declaration order, primary key columns first. The primary key is
/// the partition key followed by the clustering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [ColumnSchema],
    pub partition_key: &'static [&'static str],
    pub clustering_key: &'static [&'static str],
}

impl TableSchema {
    /// Returns the column called `name`, if any.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Returns the position of the column called `name`, if any.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Returns the primary key column names, partition key first.
    pub fn primary_key(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.partition_key
            .iter()
            .chain(self.clustering_key.iter())
            .copied()
    }
}

/// `session_metadata`: what was played in session S at step N.
pub const SESSION_METADATA: TableSchema = TableSchema {
    name: "session_metadata",
    columns: &[
        ColumnSchema::new("session_id", ColumnType::Int, CanonicalField::SessionId),
        ColumnSchema::new(
            "item_in_session",
            ColumnType::Int,
            CanonicalField::ItemInSession,
        ),
        ColumnSchema::new("artist", ColumnType::Text, CanonicalField::Artist),
        ColumnSchema::new("song", ColumnType::Text, CanonicalField::Song),
        ColumnSchema::new("length", ColumnType::Decimal, CanonicalField::Length),
    ],
    partition_key: &["session_id"],
    clustering_key: &["item_in_session"],
};

/// `user_metadata`: what user U played, in session and step order.
pub const USER_METADATA: TableSchema = TableSchema {
    name: "user_metadata",
    columns: &[
        ColumnSchema::new("user_id", ColumnType::Int, CanonicalField::UserId),
        ColumnSchema::new("session_id", ColumnType::Int, CanonicalField::SessionId),
        ColumnSchema::new(
            "item_in_session",
            ColumnType::Int,
            CanonicalField::ItemInSession,
        ),
        ColumnSchema::new("artist", ColumnType::Text, CanonicalField::Artist),
        ColumnSchema::new("song", ColumnType::Text, CanonicalField::Song),
        ColumnSchema::new("first_name", ColumnType::Text, CanonicalField::FirstName),
        ColumnSchema::new("last_name", ColumnType::Text, CanonicalField::LastName),
    ],
    partition_key: &["user_id"],
    clustering_key: &["session_id", "item_in_session"],
};

/// `song_metadata`: who has listened to song X.
pub const SONG_METADATA: TableSchema = TableSchema {
    name: "song_metadata",
    columns: &[
        ColumnSchema::new("song", ColumnType::Text, CanonicalField::Song),
        ColumnSchema::new("user_id", ColumnType::Int, CanonicalField::UserId),
        ColumnSchema::new("first_name", ColumnType::Text, CanonicalField::FirstName),
        ColumnSchema::new("last_name", ColumnType::Text, CanonicalField::LastName),
    ],
    partition_key: &["song"],
    clustering_key: &["user_id"],
};

/// The target tables, in load order.
pub const TARGET_TABLES: [&TableSchema; 3] = [&SESSION_METADATA, &USER_METADATA, &SONG_METADATA];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_keys_reference_declared_columns() {
        for table in TARGET_TABLES {
            for key in table.primary_key() {
                assert!(table.column(key).is_some(), "{}.{key}", table.name);
            }
        }
    }

    #[test]
    fn columns_carry_their_source_field_name() {
        for table in TARGET_TABLES {
            for column in table.columns {
                assert_eq!(column.name, column.source.name());
            }
        }
    }

    #[test]
    fn user_metadata_key_order() {
        assert_eq!(
            USER_METADATA.primary_key().collect::<Vec<_>>(),
            vec!["user_id", "session_id", "item_in_session"]
        );
        assert_eq!(USER_METADATA.column_index("first_name"), Some(5));
    }
}
