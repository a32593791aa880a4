use std::fs;
use std::path::Path;

use tracing::info;

use crate::bail;
use crate::canonical::{CanonicalField, CanonicalRecord};
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;

/// Writes `records` as the canonical CSV artifact at `path`, replacing any previous file.
///
/// Every field is quoted and the first line is the canonical header. Returns the number of
/// data rows written.
pub fn write_artifact(path: &Path, records: &[CanonicalRecord]) -> EtlResult<usize> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .from_path(path)
        .map_err(|err| {
            etl_error!(
                ErrorKind::IoError,
                "Canonical artifact could not be created",
                format!("File `{}`: {err}", path.display()),
                source: err
            )
        })?;

    // The header is written by hand so an empty record set still yields a valid artifact.
    writer.write_record(CanonicalField::header())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "wrote canonical artifact");

    Ok(records.len())
}

/// Reads the canonical artifact back from `path`.
///
/// The header must list the canonical fields in canonical order and no record may have an
/// empty artist. Any violation fails the read.
pub fn read_artifact(path: &Path) -> EtlResult<Vec<CanonicalRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|err| {
            etl_error!(
                ErrorKind::IoError,
                "Canonical artifact could not be opened",
                format!("File `{}`: {err}", path.display()),
                source: err
            )
        })?;

    let headers = reader.headers()?.clone();
    let expected = CanonicalField::header();
    if headers.len() != expected.len() || headers.iter().zip(expected).any(|(a, b)| a != b) {
        bail!(
            ErrorKind::InvalidData,
            "Canonical artifact header mismatch",
            format!(
                "File `{}` has header [{}], expected [{}]",
                path.display(),
                headers.iter().collect::<Vec<_>>().join(", "),
                expected.join(", ")
            )
        );
    }

    let mut records = Vec::new();
    for (index, record) in reader.deserialize::<CanonicalRecord>().enumerate() {
        let record = record?;
        if record.artist.is_empty() {
            bail!(
                ErrorKind::InvalidData,
                "Canonical artifact contains a record without artist",
                format!("File `{}`, data row {}", path.display(), index + 1)
            );
        }

        records.push(record);
    }

    info!(path = %path.display(), rows = records.len(), "read canonical artifact");

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(artist: &str, location: &str) -> CanonicalRecord {
        CanonicalRecord {
            artist: artist.to_owned(),
            first_name: "Jayden".to_owned(),
            gender: "M".to_owned(),
            item_in_session: "0".to_owned(),
            last_name: "Bell".to_owned(),
            length: "245.34159".to_owned(),
            level: "free".to_owned(),
            location: location.to_owned(),
            session_id: "829".to_owned(),
            song: "Sehr kosmisch".to_owned(),
            user_id: "91".to_owned(),
        }
    }

    #[test]
    fn every_field_is_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.csv");

        write_artifact(&path, &[record("Harmonia", "Dallas, TX")]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some(
                "\"artist\",\"first_name\",\"gender\",\"item_in_session\",\"last_name\",\"length\",\"level\",\"location\",\"session_id\",\"song\",\"user_id\""
            )
        );
        assert_eq!(
            lines.next(),
            Some(
                "\"Harmonia\",\"Jayden\",\"M\",\"0\",\"Bell\",\"245.34159\",\"free\",\"Dallas, TX\",\"829\",\"Sehr kosmisch\",\"91\""
            )
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn artifact_reads_back_written_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("artifact.csv");
        let records = vec![record("Harmonia", "Dallas, TX"), record("The Prodigy", "")];

        write_artifact(&path, &records).unwrap();

        assert_eq!(read_artifact(&path).unwrap(), records);
    }

    #[test]
    fn empty_record_set_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.csv");

        write_artifact(&path, &[]).unwrap();

        assert!(read_artifact(&path).unwrap().is_empty());
    }

    #[test]
    fn reordered_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.csv");
        fs::write(
            &path,
            "first_name,artist,gender,item_in_session,last_name,length,level,location,session_id,song,user_id\n",
        )
        .unwrap();

        let err = read_artifact(&path).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn empty_artist_in_artifact_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.csv");
        write_artifact(&path, &[record("", "Dallas, TX")]).unwrap();

        let err = read_artifact(&path).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn missing_artifact_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = read_artifact(&dir.path().join("missing.csv")).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IoError);
    }
}
