//! Submission tracking.
//!
//! Keeps a per-submission event log and the recorded terminal outcome:
//! - Submission to custody
//! - Custody status changes
//! - Anomalies and cancellation requests
//! - Resolution

mod events;
mod tracker;

pub use events::*;
pub use tracker::*;
