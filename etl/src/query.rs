//! The three fixed lookups the target tables are shaped for.
//!
//! Each lookup is a typed query object holding its parameters. It describes the select it
//! needs as a [`SelectStatement`] and decodes the returned rows into its output type, so
//! parameters are always bound by the destination and never spliced into CQL text.

use std::fmt;

use bigdecimal::BigDecimal;

use crate::bail;
use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::schema::{SESSION_METADATA, SONG_METADATA, TableSchema, USER_METADATA};
use crate::types::{Cell, TableRow};

/// A parametrized single-partition select against one target table.
///
/// Filters are equality restrictions on primary key columns, in primary key order.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table: &'static TableSchema,
    pub columns: &'static [&'static str],
    pub filters: Vec<(&'static str, Cell)>,
}

impl SelectStatement {
    /// Returns the bound filter values in filter order.
    pub fn filter_values(&self) -> impl Iterator<Item = &Cell> {
        self.filters.iter().map(|(_, value)| value)
    }
}

/// A typed lookup against one of the target tables.
pub trait Lookup {
    /// The decoded form of one result row.
    type Output;

    /// Builds the select answering this lookup.
    fn statement(&self) -> SelectStatement;

    /// Decodes one row whose values follow [`SelectStatement::columns`].
    fn decode_row(row: &TableRow) -> EtlResult<Self::Output>;
}

/// Runs `lookup` against `destination` and decodes every returned row.
pub async fn run_lookup<D, L>(destination: &D, lookup: &L) -> EtlResult<Vec<L::Output>>
where
    D: Destination,
    L: Lookup,
{
    let statement = lookup.statement();
    let rows = destination.select_rows(&statement).await?;

    rows.iter().map(L::decode_row).collect()
}

/// Songs played in a session at a given step, from `session_metadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayedInSessionQuery {
    pub session_id: i32,
    pub item_in_session: i32,
}

/// A row answering [`PlayedInSessionQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedSong {
    pub artist: String,
    pub song: String,
    pub length: BigDecimal,
}

impl Lookup for PlayedInSessionQuery {
    type Output = PlayedSong;

    fn statement(&self) -> SelectStatement {
        SelectStatement {
            table: &SESSION_METADATA,
            columns: &["artist", "song", "length"],
            filters: vec![
                ("session_id", Cell::I32(self.session_id)),
                ("item_in_session", Cell::I32(self.item_in_session)),
            ],
        }
    }

    fn decode_row(row: &TableRow) -> EtlResult<PlayedSong> {
        Ok(PlayedSong {
            artist: text_at(row, 0, "artist")?,
            song: text_at(row, 1, "song")?,
            length: decimal_at(row, 2, "length")?,
        })
    }
}

impl fmt::Display for PlayedSong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.artist, self.song, self.length)
    }
}

/// Songs a user played during one session, from `user_metadata`.
///
/// Rows come back ordered by `item_in_session` ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSessionQuery {
    pub user_id: i32,
    pub session_id: i32,
}

/// A row answering [`UserSessionQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSessionPlay {
    pub artist: String,
    pub song: String,
    pub first_name: String,
    pub last_name: String,
    pub item_in_session: i32,
}

impl Lookup for UserSessionQuery {
    type Output = UserSessionPlay;

    fn statement(&self) -> SelectStatement {
        SelectStatement {
            table: &USER_METADATA,
            columns: &["artist", "song", "first_name", "last_name", "item_in_session"],
            filters: vec![
                ("user_id", Cell::I32(self.user_id)),
                ("session_id", Cell::I32(self.session_id)),
            ],
        }
    }

    fn decode_row(row: &TableRow) -> EtlResult<UserSessionPlay> {
        Ok(UserSessionPlay {
            artist: text_at(row, 0, "artist")?,
            song: text_at(row, 1, "song")?,
            first_name: text_at(row, 2, "first_name")?,
            last_name: text_at(row, 3, "last_name")?,
            item_in_session: int_at(row, 4, "item_in_session")?,
        })
    }
}

impl fmt::Display for UserSessionPlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. {} - {} ({} {})",
            self.item_in_session, self.artist, self.song, self.first_name, self.last_name
        )
    }
}

/// Users who listened to a song, from `song_metadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongListenersQuery {
    pub song: String,
}

/// A row answering [`SongListenersQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongListener {
    pub song: String,
    pub first_name: String,
    pub last_name: String,
}

impl Lookup for SongListenersQuery {
    type Output = SongListener;

    fn statement(&self) -> SelectStatement {
        SelectStatement {
            table: &SONG_METADATA,
            columns: &["song", "first_name", "last_name"],
            filters: vec![("song", Cell::String(self.song.clone()))],
        }
    }

    fn decode_row(row: &TableRow) -> EtlResult<SongListener> {
        Ok(SongListener {
            song: text_at(row, 0, "song")?,
            first_name: text_at(row, 1, "first_name")?,
            last_name: text_at(row, 2, "last_name")?,
        })
    }
}

impl fmt::Display for SongListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.first_name, self.last_name, self.song)
    }
}

fn text_at(row: &TableRow, index: usize, column: &'static str) -> EtlResult<String> {
    let cell = row.get(index);
    // A text column that was never written reads back as null.
    if let Some(Cell::Null) = cell {
        return Ok(String::new());
    }

    match cell.and_then(Cell::as_str) {
        Some(value) => Ok(value.to_owned()),
        None => unexpected_cell(column, "text", cell),
    }
}

fn int_at(row: &TableRow, index: usize, column: &'static str) -> EtlResult<i32> {
    let cell = row.get(index);
    match cell.and_then(Cell::as_i32) {
        Some(value) => Ok(value),
        None => unexpected_cell(column, "int", cell),
    }
}

fn decimal_at(row: &TableRow, index: usize, column: &'static str) -> EtlResult<BigDecimal> {
    let cell = row.get(index);
    match cell.and_then(Cell::as_numeric) {
        Some(value) => Ok(value.clone()),
        None => unexpected_cell(column, "decimal", cell),
    }
}

fn unexpected_cell<T>(column: &str, expected: &str, found: Option<&Cell>) -> EtlResult<T> {
    let found = found.map(Cell::type_name).unwrap_or("nothing");

    bail!(
        ErrorKind::DeserializationError,
        "Unexpected value in lookup result",
        format!("Column `{column}` should hold {expected}, found {found}")
    )
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn session_lookup_filters_on_full_primary_key() {
        let statement = PlayedInSessionQuery {
            session_id: 338,
            item_in_session: 4,
        }
        .statement();

        assert_eq!(statement.table.name, "session_metadata");
        assert_eq!(
            statement.filter_values().cloned().collect::<Vec<_>>(),
            vec![Cell::I32(338), Cell::I32(4)]
        );
    }

    #[test]
    fn played_song_is_decoded() {
        let row = TableRow::new(vec![
            Cell::from("Faithless"),
            Cell::from("Music Matters (Mark Knight Dub)"),
            Cell::Numeric(BigDecimal::from_str("495.3073").unwrap()),
        ]);

        let decoded = PlayedInSessionQuery::decode_row(&row).unwrap();

        assert_eq!(decoded.artist, "Faithless");
        assert_eq!(decoded.length.to_string(), "495.3073");
    }

    #[test]
    fn mistyped_row_is_rejected() {
        let row = TableRow::new(vec![Cell::from("All Hands Against His Own"), Cell::I32(1)]);

        let err = SongListenersQuery::decode_row(&row).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DeserializationError);
    }
}
