//! Helpers for tests exercising the pipeline end to end.
//!
//! - [`event_files`] builds temporary event directories in the upstream log layout.
//! - [`faulty_destination`] wraps a destination to inject failures and count calls.

pub mod event_files;
pub mod faulty_destination;
