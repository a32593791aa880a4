//! Stores the target tables are loaded into.
//!
//! [`Destination`] abstracts the store session: schema reset, parametrized row writes,
//! parametrized single-partition selects and release of the session.

mod base;
#[cfg(feature = "cassandra")]
pub mod cassandra;
pub mod memory;

pub use base::Destination;
