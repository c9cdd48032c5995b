//! Custody-side submission: destination resolution, submission and
//! reconciliation of custody status against the chain.

mod bridge;
mod whitelist;

pub use bridge::*;
pub use whitelist::*;
