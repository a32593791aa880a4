//! Canonicalization of raw event rows.
//!
//! Raw rows are re-projected into the fixed 11-field [`CanonicalRecord`] layout using a
//! [`RawFieldMap`]. Rows without an artist are filtered and rows too short for the map are
//! skipped as malformed. The kept records are persisted as the CSV artifact every target
//! table is loaded from.

mod artifact;
mod fields;

pub use artifact::{read_artifact, write_artifact};
pub use fields::{CanonicalField, CanonicalRecord, RawFieldMap};

use tracing::{debug, info};

use crate::extract::RawEventRow;

/// Result of canonicalizing a batch of raw rows.
#[derive(Debug, Clone, Default)]
pub struct CanonicalOutcome {
    /// Records that passed the artist filter, in input order.
    pub records: Vec<CanonicalRecord>,
    /// Rows dropped because their artist field was empty.
    pub dropped_empty_artist: usize,
    /// Rows skipped because they had too few fields for the field map.
    pub skipped_malformed: usize,
}

impl CanonicalOutcome {
    /// Returns the number of rows that were not kept.
    pub fn dropped(&self) -> usize {
        self.dropped_empty_artist + self.skipped_malformed
    }

    /// Returns the number of rows that were examined.
    pub fn input_rows(&self) -> usize {
        self.records.len() + self.dropped()
    }
}

/// Builds canonical records out of `rows`.
///
/// Every input row ends up in exactly one of the kept, filtered or malformed buckets.
pub fn canonicalize(rows: &[RawEventRow], field_map: &RawFieldMap) -> CanonicalOutcome {
    let mut outcome = CanonicalOutcome::default();

    for (index, row) in rows.iter().enumerate() {
        match row.field(field_map.artist) {
            Some("") => {
                outcome.dropped_empty_artist += 1;
                continue;
            }
            Some(_) => {}
            None => {
                debug!(row = index, fields = row.len(), "skipping raw row without artist field");
                outcome.skipped_malformed += 1;
                continue;
            }
        }

        match field_map.project(row) {
            Some(record) => outcome.records.push(record),
            None => {
                debug!(
                    row = index,
                    fields = row.len(),
                    required = field_map.required_fields(),
                    "skipping malformed raw row"
                );
                outcome.skipped_malformed += 1;
            }
        }
    }

    info!(
        input = rows.len(),
        kept = outcome.records.len(),
        dropped_empty_artist = outcome.dropped_empty_artist,
        skipped_malformed = outcome.skipped_malformed,
        "canonicalized raw event rows"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row(artist: &str, session_id: &str) -> RawEventRow {
        let mut fields = vec![String::new(); 17];
        fields[0] = artist.to_owned();
        fields[2] = "Kaylee".to_owned();
        fields[12] = session_id.to_owned();
        fields[16] = "8".to_owned();
        RawEventRow::new(fields)
    }

    #[test]
    fn empty_artist_rows_are_dropped() {
        let rows = vec![
            raw_row("Muse", "139"),
            raw_row("", "139"),
            raw_row("Fugazi", "140"),
        ];

        let outcome = canonicalize(&rows, &RawFieldMap::default());

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.dropped_empty_artist, 1);
        assert_eq!(outcome.skipped_malformed, 0);
        assert!(outcome.records.iter().all(|r| !r.artist.is_empty()));
    }

    #[test]
    fn short_rows_are_counted_as_malformed() {
        let rows = vec![
            raw_row("Muse", "139"),
            RawEventRow::new(vec!["Muse".to_owned(), "Logged In".to_owned()]),
            RawEventRow::new(vec![]),
        ];

        let outcome = canonicalize(&rows, &RawFieldMap::default());

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.skipped_malformed, 2);
    }

    #[test]
    fn every_row_lands_in_one_bucket() {
        let mut rows = Vec::new();
        for i in 0..25 {
            let row = match i % 5 {
                0 => raw_row("", "1"),
                1 => RawEventRow::new(vec!["Muse".to_owned(); i % 13]),
                _ => raw_row("Muse", "1"),
            };
            rows.push(row);
        }

        let outcome = canonicalize(&rows, &RawFieldMap::default());

        assert_eq!(outcome.input_rows(), rows.len());
        assert_eq!(outcome.records.len() + outcome.dropped(), rows.len());
    }

    #[test]
    fn fields_follow_the_field_map() {
        let outcome = canonicalize(&[raw_row("Muse", "139")], &RawFieldMap::default());
        let record = &outcome.records[0];

        assert_eq!(record.artist, "Muse");
        assert_eq!(record.first_name, "Kaylee");
        assert_eq!(record.session_id, "139");
        assert_eq!(record.user_id, "8");
    }
}
