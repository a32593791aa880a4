use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extract::RawEventRow;

/// A field of the canonical record, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Artist,
    FirstName,
    Gender,
    ItemInSession,
    LastName,
    Length,
    Level,
    Location,
    SessionId,
    Song,
    UserId,
}

impl CanonicalField {
    /// All fields in canonical order.
    pub const ALL: [CanonicalField; 11] = [
        CanonicalField::Artist,
        CanonicalField::FirstName,
        CanonicalField::Gender,
        CanonicalField::ItemInSession,
        CanonicalField::LastName,
        CanonicalField::Length,
        CanonicalField::Level,
        CanonicalField::Location,
        CanonicalField::SessionId,
        CanonicalField::Song,
        CanonicalField::UserId,
    ];

    /// Returns the column name used in the artifact header and the target tables.
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::Artist => "artist",
            CanonicalField::FirstName => "first_name",
            CanonicalField::Gender => "gender",
            CanonicalField::ItemInSession => "item_in_session",
            CanonicalField::LastName => "last_name",
            CanonicalField::Length => "length",
            CanonicalField::Level => "level",
            CanonicalField::Location => "location",
            CanonicalField::SessionId => "session_id",
            CanonicalField::Song => "song",
            CanonicalField::UserId => "user_id",
        }
    }

    /// Returns the artifact header, the names of [`CanonicalField::ALL`].
    pub fn header() -> [&'static str; 11] {
        CanonicalField::ALL.map(|field| field.name())
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Positions of the canonical fields inside a raw event row.
///
/// The defaults match the upstream event log layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFieldMap {
    pub artist: usize,
    pub first_name: usize,
    pub gender: usize,
    pub item_in_session: usize,
    pub last_name: usize,
    pub length: usize,
    pub level: usize,
    pub location: usize,
    pub session_id: usize,
    pub song: usize,
    pub user_id: usize,
}

impl RawFieldMap {
    /// Returns the raw position of `field`.
    pub fn position(&self, field: CanonicalField) -> usize {
        match field {
            CanonicalField::Artist => self.artist,
            CanonicalField::FirstName => self.first_name,
            CanonicalField::Gender => self.gender,
            CanonicalField::ItemInSession => self.item_in_session,
            CanonicalField::LastName => self.last_name,
            CanonicalField::Length => self.length,
            CanonicalField::Level => self.level,
            CanonicalField::Location => self.location,
            CanonicalField::SessionId => self.session_id,
            CanonicalField::Song => self.song,
            CanonicalField::UserId => self.user_id,
        }
    }

    /// Returns the minimum number of fields a raw row needs for every position to exist.
    pub fn required_fields(&self) -> usize {
        CanonicalField::ALL
            .iter()
            .map(|field| self.position(*field) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Projects a raw row into a canonical record, or `None` if the row is too short.
    pub fn project(&self, row: &RawEventRow) -> Option<CanonicalRecord> {
        let take = |field: CanonicalField| row.field(self.position(field)).map(str::to_owned);

        Some(CanonicalRecord {
            artist: take(CanonicalField::Artist)?,
            first_name: take(CanonicalField::FirstName)?,
            gender: take(CanonicalField::Gender)?,
            item_in_session: take(CanonicalField::ItemInSession)?,
            last_name: take(CanonicalField::LastName)?,
            length: take(CanonicalField::Length)?,
            level: take(CanonicalField::Level)?,
            location: take(CanonicalField::Location)?,
            session_id: take(CanonicalField::SessionId)?,
            song: take(CanonicalField::Song)?,
            user_id: take(CanonicalField::UserId)?,
        })
    }
}

impl Default for RawFieldMap {
    fn default() -> Self {
        Self {
            artist: 0,
            first_name: 2,
            gender: 3,
            item_in_session: 4,
            last_name: 5,
            length: 6,
            level: 7,
            location: 8,
            session_id: 12,
            song: 13,
            user_id: 16,
        }
    }
}

/// A normalized event, still untyped.
///
/// Field declaration order is the canonical order and must stay in sync with
/// [`CanonicalField::ALL`], the CSV serializer relies on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub artist: String,
    pub first_name: String,
    pub gender: String,
    pub item_in_session: String,
    pub last_name: String,
    pub length: String,
    pub level: String,
    pub location: String,
    pub session_id: String,
    pub song: String,
    pub user_id: String,
}

impl CanonicalRecord {
    /// Returns the value of `field`.
    pub fn field(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Artist => &self.artist,
            CanonicalField::FirstName => &self.first_name,
            CanonicalField::Gender => &self.gender,
            CanonicalField::ItemInSession => &self.item_in_session,
            CanonicalField::LastName => &self.last_name,
            CanonicalField::Length => &self.length,
            CanonicalField::Level => &self.level,
            CanonicalField::Location => &self.location,
            CanonicalField::SessionId => &self.session_id,
            CanonicalField::Song => &self.song,
            CanonicalField::UserId => &self.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_requires_seventeen_fields() {
        assert_eq!(RawFieldMap::default().required_fields(), 17);
    }

    #[test]
    fn header_is_in_canonical_order() {
        assert_eq!(
            CanonicalField::header(),
            [
                "artist",
                "first_name",
                "gender",
                "item_in_session",
                "last_name",
                "length",
                "level",
                "location",
                "session_id",
                "song",
                "user_id",
            ]
        );
    }

    #[test]
    fn custom_map_reads_other_positions() {
        let map = RawFieldMap {
            artist: 1,
            first_name: 0,
            gender: 0,
            item_in_session: 0,
            last_name: 0,
            length: 0,
            level: 0,
            location: 0,
            session_id: 0,
            song: 2,
            user_id: 0,
        };
        let row = RawEventRow::new(vec!["x".into(), "Muse".into(), "Uprising".into()]);

        let record = map.project(&row).unwrap();

        assert_eq!(map.required_fields(), 3);
        assert_eq!(record.field(CanonicalField::Artist), "Muse");
        assert_eq!(record.field(CanonicalField::Song), "Uprising");
    }
}
