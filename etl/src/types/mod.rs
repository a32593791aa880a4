//! Value types shared by the projector, the lookups and the destinations.

mod cell;
mod table_row;

pub use cell::*;
pub use table_row::*;
