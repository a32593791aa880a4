//! Cassandra compatible destination speaking CQL through the `scylla` driver.

mod core;
mod encoding;

pub use self::core::CassandraDestination;
