//! Connection negotiation, conversation provisioning, and mismatch checks.
//!
//! The protocol layer drives the external messaging service through the
//! [`Sessions`] interface: pairwise connection negotiation with a bounded
//! retry budget, conversation lookup/creation for a bot group, and validation
//! of the client mismatch reports that message sends return.

pub mod connect;
pub mod conv;
pub mod mismatch;
pub mod session;

/// Retry budget for pairwise connection negotiation. Roles swap on every
/// attempt, so each side drives at most three times.
pub const CONNECT_ATTEMPTS: usize = 6;

pub use connect::{connect_pair, Connectedness, RelationStatus};
pub use conv::prepare_conv;
pub use mismatch::{
    assert_client_missing, assert_no_mismatch, ClientMap, ClientMismatch, MismatchFailure,
};
pub use session::{Bot, BotId, ClientId, ConvId, Sessions, UserId};
