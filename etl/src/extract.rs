//! Reading of raw event log files.
//!
//! Every regular file directly under the event directory is parsed as CSV. The header line
//! of each file is discarded and all remaining records are concatenated, in file name order
//! and then line order, into one sequence of untyped rows.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;

/// One data line of an event log file, as untyped fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEventRow {
    fields: Vec<String>,
}

impl RawEventRow {
    /// Creates a raw row from its fields in file order.
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Returns the field at `position`, if the row is long enough.
    pub fn field(&self, position: usize) -> Option<&str> {
        self.fields.get(position).map(String::as_str)
    }

    /// Returns all fields in file order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the number of fields in the row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Raw rows gathered from an event directory.
#[derive(Debug, Clone, Default)]
pub struct ExtractedEvents {
    /// Files that were read, in the order they were read.
    pub files: Vec<PathBuf>,
    /// Data rows of all files, concatenated.
    pub rows: Vec<RawEventRow>,
}

/// Lists the regular files directly under `directory`, sorted by file name.
///
/// Hidden entries, subdirectories and other non-regular entries are ignored.
pub fn discover_event_files(directory: &Path) -> EtlResult<Vec<PathBuf>> {
    let entries = fs::read_dir(directory).map_err(|err| {
        etl_error!(
            ErrorKind::SourceIoError,
            "Event directory could not be read",
            format!("Directory `{}`: {err}", directory.display()),
            source: err
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            etl_error!(
                ErrorKind::SourceIoError,
                "Event directory entry could not be read",
                format!("Directory `{}`: {err}", directory.display()),
                source: err
            )
        })?;

        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            debug!(path = %path.display(), "skipping hidden entry in event directory");
            continue;
        }

        // Follows symlinks so a linked file counts as a regular file.
        let metadata = fs::metadata(&path).map_err(|err| {
            etl_error!(
                ErrorKind::SourceIoError,
                "Event file metadata could not be read",
                format!("File `{}`: {err}", path.display()),
                source: err
            )
        })?;

        if metadata.is_file() {
            files.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-regular entry in event directory");
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Reads the data rows of a single event file, discarding its header line.
///
/// Records may have varying field counts. An empty file yields no rows.
pub fn read_event_file(path: &Path) -> EtlResult<Vec<RawEventRow>> {
    let file = fs::File::open(path).map_err(|err| {
        etl_error!(
            ErrorKind::SourceIoError,
            "Event file could not be opened",
            format!("File `{}`: {err}", path.display()),
            source: err
        )
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| {
            etl_error!(
                ErrorKind::SourceIoError,
                "Event file could not be parsed",
                format!("File `{}`: {err}", path.display()),
                source: err
            )
        })?;

        rows.push(RawEventRow::new(
            record.iter().map(str::to_owned).collect(),
        ));
    }

    Ok(rows)
}

/// Reads every event file under `directory` into one sequence of raw rows.
///
/// A missing or unreadable directory or file fails the whole extraction.
pub fn extract_event_rows(directory: &Path) -> EtlResult<ExtractedEvents> {
    let files = discover_event_files(directory)?;

    let mut rows = Vec::new();
    for file in &files {
        let file_rows = read_event_file(file)?;
        if file_rows.is_empty() {
            warn!(path = %file.display(), "event file contains no data rows");
        }

        debug!(path = %file.display(), rows = file_rows.len(), "read event file");
        rows.extend(file_rows);
    }

    info!(
        directory = %directory.display(),
        files = files.len(),
        rows = rows.len(),
        "extracted raw event rows"
    );

    Ok(ExtractedEvents { files, rows })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const HEADER: &str = "artist,auth,firstName\n";

    #[test]
    fn files_are_read_in_name_order_without_headers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), format!("{HEADER}b1,x,y\n")).unwrap();
        fs::write(dir.path().join("a.csv"), format!("{HEADER}a1,x,y\na2,x\n")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.csv"), format!("{HEADER}c1\n")).unwrap();

        let extracted = extract_event_rows(dir.path()).unwrap();

        let artists: Vec<_> = extracted
            .rows
            .iter()
            .map(|row| row.field(0).unwrap())
            .collect();
        assert_eq!(artists, vec!["a1", "a2", "b1"]);
        assert_eq!(extracted.files.len(), 2);
        assert_eq!(extracted.rows[1].fields(), ["a2", "x"]);
    }

    #[test]
    fn hidden_entries_are_not_event_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("2018-11-01-events.csv"),
            format!("{HEADER}Muse,x,y\n"),
        )
        .unwrap();
        fs::write(dir.path().join(".DS_Store"), [0x00, 0x00, 0x00, 0x01, 0xff, 0xfe]).unwrap();
        fs::create_dir(dir.path().join(".ipynb_checkpoints")).unwrap();

        let extracted = extract_event_rows(dir.path()).unwrap();

        assert_eq!(
            extracted.files,
            vec![dir.path().join("2018-11-01-events.csv")]
        );
        assert_eq!(extracted.rows.len(), 1);
        assert_eq!(extracted.rows[0].field(0), Some("Muse"));
    }

    #[test]
    fn empty_file_contributes_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.csv"), "").unwrap();
        fs::write(dir.path().join("header_only.csv"), HEADER).unwrap();

        let extracted = extract_event_rows(dir.path()).unwrap();

        assert!(extracted.rows.is_empty());
        assert_eq!(extracted.files.len(), 2);
    }

    #[test]
    fn quoted_fields_keep_embedded_commas() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("events.csv"),
            format!("{HEADER}\"Tokyo, Japan\",x,\"He said \"\"hi\"\"\"\n"),
        )
        .unwrap();

        let extracted = extract_event_rows(dir.path()).unwrap();

        assert_eq!(extracted.rows[0].field(0), Some("Tokyo, Japan"));
        assert_eq!(extracted.rows[0].field(2), Some("He said \"hi\""));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();

        let err = extract_event_rows(&dir.path().join("missing")).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SourceIoError);
    }
}
