use std::fs;
use std::path::{Path, PathBuf};

use etl_config::shared::PipelineConfig;
use tempfile::TempDir;

/// Header of the upstream event log files.
pub const EVENT_FILE_HEADER: [&str; 17] = [
    "artist",
    "auth",
    "firstName",
    "gender",
    "itemInSession",
    "lastName",
    "length",
    "level",
    "location",
    "method",
    "page",
    "registration",
    "sessionId",
    "song",
    "status",
    "ts",
    "userId",
];

/// Builder for one data line of an event log file.
///
/// Starts from a plausible `NextSong` event, setters override single fields.
#[derive(Debug, Clone)]
pub struct RawEventLine {
    fields: Vec<String>,
}

impl RawEventLine {
    pub fn new() -> Self {
        let fields = [
            "Harmonia",
            "Logged In",
            "Ryan",
            "M",
            "0",
            "Smith",
            "655.77751",
            "free",
            "San Jose-Sunnyvale-Santa Clara, CA",
            "PUT",
            "NextSong",
            "1.54102E+12",
            "583",
            "Sehr kosmisch",
            "200",
            "1.54224E+12",
            "26",
        ];

        Self {
            fields: fields.iter().map(|field| (*field).to_owned()).collect(),
        }
    }

    fn set(mut self, position: usize, value: &str) -> Self {
        self.fields[position] = value.to_owned();
        self
    }

    pub fn artist(self, value: &str) -> Self {
        self.set(0, value)
    }

    pub fn first_name(self, value: &str) -> Self {
        self.set(2, value)
    }

    pub fn item_in_session(self, value: &str) -> Self {
        self.set(4, value)
    }

    pub fn last_name(self, value: &str) -> Self {
        self.set(5, value)
    }

    pub fn length(self, value: &str) -> Self {
        self.set(6, value)
    }

    pub fn location(self, value: &str) -> Self {
        self.set(8, value)
    }

    pub fn session_id(self, value: &str) -> Self {
        self.set(12, value)
    }

    pub fn song(self, value: &str) -> Self {
        self.set(13, value)
    }

    pub fn user_id(self, value: &str) -> Self {
        self.set(16, value)
    }

    /// Keeps only the first `len` fields, producing a short line.
    pub fn truncated(mut self, len: usize) -> Self {
        self.fields.truncate(len);
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Default for RawEventLine {
    fn default() -> Self {
        Self::new()
    }
}

/// Temporary layout with an event directory and a place for the canonical artifact.
///
/// Everything is removed when the value is dropped.
pub struct EventDirectory {
    root: TempDir,
}

impl EventDirectory {
    /// Creates an empty event directory.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("failed to create temporary directory");
        fs::create_dir(root.path().join("event_data"))
            .expect("failed to create event directory");

        Self { root }
    }

    /// Returns the directory holding the event files.
    pub fn event_data_dir(&self) -> PathBuf {
        self.root.path().join("event_data")
    }

    /// Returns where the canonical artifact is written.
    pub fn artifact_path(&self) -> PathBuf {
        self.root.path().join("event_datafile_new.csv")
    }

    /// Returns a pipeline configuration pointing at this layout.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            event_data_dir: self.event_data_dir(),
            artifact_path: self.artifact_path(),
        }
    }

    /// Writes an event file with the upstream header followed by `lines`.
    pub fn add_file(&self, name: &str, lines: &[RawEventLine]) -> PathBuf {
        let path = self.event_data_dir().join(name);
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .expect("failed to create event file");

        writer
            .write_record(EVENT_FILE_HEADER)
            .expect("failed to write event header");
        for line in lines {
            writer
                .write_record(line.fields())
                .expect("failed to write event line");
        }
        writer.flush().expect("failed to flush event file");

        path
    }

    /// Writes a file with arbitrary contents into the event directory.
    pub fn add_raw_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.event_data_dir().join(name);
        fs::write(&path, contents).expect("failed to write raw event file");
        path
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }
}

impl Default for EventDirectory {
    fn default() -> Self {
        Self::new()
    }
}
