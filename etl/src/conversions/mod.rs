//! Coercion of canonical text fields into typed [`crate::types::Cell`] values.

pub mod numeric;
pub mod text;
