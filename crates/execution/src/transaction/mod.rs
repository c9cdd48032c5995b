//! Raw transaction building.

mod builder;

pub use builder::*;
