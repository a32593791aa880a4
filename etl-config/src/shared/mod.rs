//! Shared configuration types for the loader and the etl library.

mod base;
mod destination;
mod loader;
mod pipeline;

pub use base::ValidationError;
pub use destination::{CassandraConfig, DestinationConfig};
pub use loader::LoaderConfig;
pub use pipeline::PipelineConfig;
