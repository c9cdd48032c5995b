//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use custody_execution::prelude::*;
//! ```

// Custody
pub use crate::custody::{
    BridgeConfig, CustodyBridge, PollConfig, ReceiptConfig, WhitelistResolver,
};

// Errors
pub use crate::error::{
    AnomalyWarning, BuildError, ExecutionError, PollError, SubmissionError, SubmitError,
    UnresolvedSubmission, WhitelistError,
};

// Retry
pub use crate::retry::{RetryExhausted, RetryPolicy, retry, retry_if};

// Trade
pub use crate::trade::{ApprovalResult, OrchestratorConfig, SendReport, TradeOrchestrator};

// Tracking
pub use crate::tracking::{
    EventData, SubmissionEvent, SubmissionEventType, SubmissionSummary, SubmissionTracker,
    TrackerStats,
};

// Transaction
pub use crate::transaction::{BuilderConfig, TransactionBuilder};
