//! Target table definitions and the CQL built from them.

pub mod cql;
mod table;

pub use table::*;
