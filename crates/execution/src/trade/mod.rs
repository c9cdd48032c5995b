//! Caller-facing trade orchestration.

mod orchestrator;

pub use orchestrator::*;
