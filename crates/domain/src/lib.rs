//! Core data model for custody-gated transaction execution.
//!
//! Everything in this crate is plain data: call descriptors handed in by
//! strategy code, the raw transactions built from them, custody destinations,
//! status reports and terminal outcomes. No I/O happens here.

/// Unsigned contract calls.
pub mod call;
/// Custody destination variants.
pub mod destination;
/// Error types.
pub mod error;
/// Supported networks and their custody asset bindings.
pub mod network;
/// Terminal outcomes and receipt verdicts.
pub mod outcome;
/// Custody-side transaction status.
pub mod status;
/// Custody submissions.
pub mod submission;
/// Token metadata and amounts.
pub mod token;
/// Raw, submittable transactions.
pub mod transaction;

pub use call::CallDescriptor;
pub use destination::DestinationDescriptor;
pub use error::DomainError;
pub use network::Network;
pub use outcome::{Outcome, ReceiptStatus};
pub use status::{StatusReport, TransactionStatus};
pub use submission::{CustodySubmission, SubmissionId};
pub use token::{Token, TokenAmount};
pub use transaction::{GasPricing, RawTransaction};
