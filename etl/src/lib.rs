//! Batch load of event logs into query-shaped CQL tables.
//!
//! A run reads a directory of raw event CSV files ([`extract`]), normalizes them into
//! canonical records persisted as a CSV artifact ([`canonical`]), and projects the artifact
//! into three denormalized tables ([`projection`], [`schema`]) through a [`destination`].
//! [`query`] holds the typed lookups the tables are shaped for.

pub mod canonical;
pub mod conversions;
pub mod destination;
pub mod error;
pub mod extract;
mod macros;
pub mod pipeline;
pub mod projection;
pub mod query;
pub mod schema;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
