//! CQL text for the target tables.
//!
//! Only identifiers that come from static table definitions or a validated keyspace name are
//! interpolated. Values are always bound through `?` markers.

use crate::query::SelectStatement;
use crate::schema::TableSchema;

/// Returns the `CREATE KEYSPACE IF NOT EXISTS` statement using `SimpleStrategy`.
pub fn build_create_keyspace_cql(keyspace: &str, replication_factor: u32) -> String {
    format!(
        "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH replication = \
         {{'class': 'SimpleStrategy', 'replication_factor': {replication_factor}}}"
    )
}

/// Returns the `DROP TABLE IF EXISTS` statement for `table`.
pub fn build_drop_table_cql(table: &TableSchema) -> String {
    format!("DROP TABLE IF EXISTS {}", table.name)
}

/// Returns the `CREATE TABLE IF NOT EXISTS` statement for `table`.
///
/// A single-column partition key is written as `PRIMARY KEY (p, c1, c2)`, a composite one
/// as `PRIMARY KEY ((p1, p2), c1)`.
pub fn build_create_table_cql(table: &TableSchema) -> String {
    let mut definitions: Vec<String> = table
        .columns
        .iter()
        .map(|column| format!("{} {}", column.name, column.typ.as_cql()))
        .collect();

    let partition_key = match table.partition_key {
        [single] => (*single).to_owned(),
        columns => format!("({})", columns.join(", ")),
    };
    let primary_key = std::iter::once(partition_key)
        .chain(table.clustering_key.iter().map(|column| (*column).to_owned()))
        .collect::<Vec<_>>()
        .join(", ");
    definitions.push(format!("PRIMARY KEY ({primary_key})"));

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        table.name,
        definitions.join(", ")
    )
}

/// Returns the parametrized `INSERT` statement for `table`, binding every column in
/// declaration order.
pub fn build_insert_cql(table: &TableSchema) -> String {
    let columns = table
        .columns
        .iter()
        .map(|column| column.name)
        .collect::<Vec<_>>()
        .join(", ");
    let markers = vec!["?"; table.columns.len()].join(", ");

    format!("INSERT INTO {} ({columns}) VALUES ({markers})", table.name)
}

/// Returns the parametrized `SELECT` statement for `statement`, binding every filter value.
pub fn build_select_cql(statement: &SelectStatement) -> String {
    let columns = statement.columns.join(", ");
    let mut cql = format!("SELECT {columns} FROM {}", statement.table.name);

    if !statement.filters.is_empty() {
        let restrictions = statement
            .filters
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(" AND ");
        cql.push_str(" WHERE ");
        cql.push_str(&restrictions);
    }

    cql
}
