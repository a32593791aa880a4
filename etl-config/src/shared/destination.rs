use secrecy::SecretString;
use serde::Deserialize;

use crate::shared::ValidationError;

/// Maximum length of a CQL keyspace name.
const MAX_KEYSPACE_LENGTH: usize = 48;

/// Configuration of the store the canonical records are loaded into.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfig {
    /// In-process store, useful for dry runs.
    Memory,
    /// Cassandra compatible cluster reached over CQL.
    Cassandra {
        #[serde(flatten)]
        config: CassandraConfig,
    },
}

impl DestinationConfig {
    /// Validates the selected destination.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            DestinationConfig::Memory => Ok(()),
            DestinationConfig::Cassandra { config } => config.validate(),
        }
    }
}

/// Connection settings for a Cassandra compatible cluster.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CassandraConfig {
    /// Contact points in `host:port` form.
    pub nodes: Vec<String>,
    /// Keyspace created if missing and used for all tables.
    #[serde(default = "default_keyspace")]
    pub keyspace: String,
    /// Replication factor of the `SimpleStrategy` used when creating the keyspace.
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u32,
    /// Username for password authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for password authentication. Redacted in debug output.
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Timeout for establishing each connection, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl CassandraConfig {
    /// Default keyspace name.
    pub const DEFAULT_KEYSPACE: &'static str = "sparkify";

    /// Default replication factor.
    pub const DEFAULT_REPLICATION_FACTOR: u32 = 1;

    /// Default connection timeout in milliseconds.
    pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

    /// Validates contact points, keyspace and credentials.
    ///
    /// The keyspace is interpolated into DDL since CQL cannot bind identifiers, so it
    /// must be a plain identifier.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.nodes.iter().all(|node| node.trim().is_empty()) {
            return Err(ValidationError::NoContactPoints);
        }

        if !is_valid_keyspace(&self.keyspace) {
            return Err(ValidationError::InvalidKeyspace(self.keyspace.clone()));
        }

        if self.replication_factor == 0 {
            return Err(ValidationError::ReplicationFactorZero);
        }

        if self.password.is_some() && self.username.is_none() {
            return Err(ValidationError::PasswordWithoutUsername);
        }

        Ok(())
    }
}

fn is_valid_keyspace(keyspace: &str) -> bool {
    let mut chars = keyspace.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    keyspace.len() <= MAX_KEYSPACE_LENGTH
        && first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_keyspace() -> String {
    CassandraConfig::DEFAULT_KEYSPACE.to_string()
}

fn default_replication_factor() -> u32 {
    CassandraConfig::DEFAULT_REPLICATION_FACTOR
}

fn default_connect_timeout_ms() -> u64 {
    CassandraConfig::DEFAULT_CONNECT_TIMEOUT_MS
}
