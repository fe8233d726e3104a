//! Pairwise connection negotiation.
//!
//! Drives two bots from "unconnected" to "connected" with a bounded retry
//! loop. The driving role alternates between the two identities on every
//! attempt, so the side that sent a request gets out of the way and lets the
//! counterpart observe the pending request and accept it.
//!
//! # State Machine
//!
//! ```text
//!                driver's view of the pair          action            outcome
//!     [NoRelation] ──────────────────────────> send request + check    retry, roles swapped
//!     [Pending]    ──────────────────────────> accept + check          connected
//!     [Sent]       ──────────────────────────> (counterpart's turn)    retry, roles swapped
//!     [anything else: already resolved]        none                    connected
//! ```
//!
//! The retry budget is [`CONNECT_ATTEMPTS`](super::CONNECT_ATTEMPTS). When it
//! is exhausted the negotiator gives up *silently*: the pair is left as-is
//! and no error is raised. Downstream conversation provisioning is the step
//! that fails if connection never completed.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::session::{Bot, Sessions};
use super::CONNECT_ATTEMPTS;
use crate::error::Result;

/// Relation between two identities, as observed by one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationStatus {
    /// No request has been exchanged in either direction.
    NoRelation,
    /// The observing side already sent a request and is waiting.
    Sent,
    /// The observing side has an incoming request pending acceptance.
    Pending,
    /// The relation is established.
    Connected,
    /// The observing side blocked the counterpart.
    Blocked,
    /// The observing side ignored the request.
    Ignored,
    /// The request was cancelled before acceptance.
    Cancelled,
}

/// Final verdict of a negotiation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectedness {
    /// The pair reached an established (or otherwise resolved) relation.
    Connected,
    /// The retry budget ran out first. Deliberately not an error.
    NotConnected,
}

impl Connectedness {
    /// True if the pair resolved.
    pub fn is_connected(self) -> bool {
        self == Connectedness::Connected
    }
}

/// Outcome of a single attempt.
enum Step {
    Connected,
    Retry,
}

/// Negotiate the connection between `a` and `b`.
///
/// Runs at most [`CONNECT_ATTEMPTS`](super::CONNECT_ATTEMPTS) attempts,
/// swapping the driving role after every attempt that did not resolve the
/// pair. Each attempt performs one status query and at most one remote
/// mutation (request or accept), each followed by a post-condition check
/// against the service.
///
/// Exhausting the budget returns [`Connectedness::NotConnected`] without
/// raising; only remote-call and post-condition failures produce errors.
pub fn connect_pair<S: Sessions>(
    sessions: &mut S,
    a: &Bot,
    b: &Bot,
    greeting: &str,
) -> Result<Connectedness> {
    let (mut driver, mut peer) = (a, b);
    for attempt in 1..=CONNECT_ATTEMPTS {
        match connect_step(sessions, driver, peer, greeting)? {
            Step::Connected => {
                debug!(a = %a.id, b = %b.id, attempt, "pair connected");
                return Ok(Connectedness::Connected);
            }
            Step::Retry => std::mem::swap(&mut driver, &mut peer),
        }
    }
    warn!(
        a = %a.id,
        b = %b.id,
        attempts = CONNECT_ATTEMPTS,
        "connection attempts exhausted, leaving pair as-is"
    );
    Ok(Connectedness::NotConnected)
}

/// One attempt, driven from `driver`'s perspective toward `peer`.
fn connect_step<S: Sessions>(
    sessions: &mut S,
    driver: &Bot,
    peer: &Bot,
    greeting: &str,
) -> Result<Step> {
    let status = sessions.relation_status(driver, peer.id)?;
    debug!(driver = %driver.id, peer = %peer.id, ?status, "connect step");

    match status {
        RelationStatus::NoRelation => {
            sessions.request_connection(driver, peer.id, driver.address(), greeting)?;
            sessions.assert_connect_requested(driver.id, peer.id)?;
            Ok(Step::Retry)
        }
        RelationStatus::Pending => {
            sessions.accept_connection(driver, peer.id)?;
            sessions.assert_connect_accepted(driver.id, peer.id)?;
            Ok(Step::Connected)
        }
        RelationStatus::Sent => Ok(Step::Retry),
        // Connected, or resolved some other way. Nothing left to drive.
        _ => Ok(Step::Connected),
    }
}
