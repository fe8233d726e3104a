//! Harness error types.
//!
//! Two layers of failure exist in this crate:
//!
//! - **Format errors** ([`DecodeError`], [`EncodeError`]) are local and
//!   recoverable. They are returned as typed results from the wire codec and
//!   never abort anything on their own.
//! - **Scenario failures** ([`HarnessError`]) abort the enclosing scenario:
//!   caller contract violations, post-condition failures observed against the
//!   remote service, and mismatch assertion failures.
//!
//! The connection negotiator's bounded retry is the only built-in recovery
//! mechanism; it gives up cleanly instead of raising, deferring failure to
//! whatever downstream step depended on the connection.

use thiserror::Error;

use crate::codec::{DecodeError, EncodeError};
use crate::protocol::mismatch::MismatchFailure;
use crate::protocol::session::BotId;

/// Scenario-level harness errors.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Caller contract violation. Not retried.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Negotiation finished but no 1:1 conversation exists for the pair.
    #[error("no 1:1 conversation between {a} and {b}")]
    MissingConversation {
        /// Bot that performed the lookup.
        a: BotId,
        /// The counterpart.
        b: BotId,
    },

    /// The remote service did not reach the expected state.
    #[error("postcondition failed: {0}")]
    Postcondition(String),

    /// A decode-then-unwrap helper found the wrong payload variant.
    #[error("expected {expected} message, got {actual}")]
    RequirementFailed {
        /// Variant the caller required.
        expected: &'static str,
        /// Variant actually present on the wire.
        actual: &'static str,
    },

    /// A client mismatch report did not have the asserted shape.
    #[error("client mismatch assertion failed: {0}")]
    Mismatch(#[from] MismatchFailure),

    /// Wire payload failed to decode.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Message could not be encoded for the wire.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Remote session execution failed (transport, auth, service error).
    #[error("session error: {0}")]
    Session(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
