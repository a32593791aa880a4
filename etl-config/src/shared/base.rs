use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A path setting is empty.
    #[error("`{0}` cannot be empty")]
    EmptyPath(&'static str),
    /// No Cassandra contact point was configured.
    #[error("`destination.cassandra.nodes` must contain at least one contact point")]
    NoContactPoints,
    /// The keyspace is not a plain CQL identifier.
    #[error(
        "invalid keyspace `{0}`: must start with a letter and contain at most 48 letters, digits or underscores"
    )]
    InvalidKeyspace(String),
    /// The replication factor is zero.
    #[error("`destination.cassandra.replication_factor` must be greater than 0")]
    ReplicationFactorZero,
    /// A password was configured without a username.
    #[error("`destination.cassandra.password` requires `destination.cassandra.username`")]
    PasswordWithoutUsername,
}
