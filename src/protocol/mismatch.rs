//! Client mismatch report validation.
//!
//! Sending an encrypted message targets a set of per-user devices. The
//! service answers with a mismatch report describing the delta between the
//! targeted device set and the device set it actually knows: clients the
//! sender should have targeted (`missing`), targeted needlessly
//! (`redundant`), or targeted although they were deleted (`deleted`).
//!
//! The validators here are pure comparisons; the report itself comes from an
//! external message-send operation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::session::{ClientId, UserId};

/// Per-user device sets, as used by all three report fields.
pub type ClientMap = BTreeMap<UserId, BTreeSet<ClientId>>;

/// Device-targeting delta returned when sending an encrypted message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMismatch {
    /// Clients the sender failed to target.
    #[serde(default)]
    pub missing: ClientMap,
    /// Clients the sender targeted but the service no longer routes to.
    #[serde(default)]
    pub redundant: ClientMap,
    /// Clients that were deleted since the sender last synced.
    #[serde(default)]
    pub deleted: ClientMap,
}

impl ClientMismatch {
    /// True if all three mappings are empty.
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.redundant.is_empty() && self.deleted.is_empty()
    }
}

/// Structured mismatch assertion failure, carrying the compared contents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{context}: expected {expected}, got {actual}")]
pub struct MismatchFailure {
    /// Which comparison failed.
    pub context: String,
    /// Expected mapping contents.
    pub expected: String,
    /// Actual mapping contents.
    pub actual: String,
}

/// Assert that a report carries no mismatch at all.
///
/// Fails naming every non-empty mapping together with its contents.
pub fn assert_no_mismatch(report: &ClientMismatch) -> Result<(), MismatchFailure> {
    let mut offending = Vec::new();
    if !report.missing.is_empty() {
        offending.push(format!("missing={:?}", report.missing));
    }
    if !report.redundant.is_empty() {
        offending.push(format!("redundant={:?}", report.redundant));
    }
    if !report.deleted.is_empty() {
        offending.push(format!("deleted={:?}", report.deleted));
    }

    if offending.is_empty() {
        Ok(())
    } else {
        Err(MismatchFailure {
            context: "client mismatch report is not empty".to_string(),
            expected: "missing, redundant and deleted all empty".to_string(),
            actual: offending.join(", "),
        })
    }
}

/// Assert that `missing` names exactly `{user -> {client}}` and nothing else.
pub fn assert_client_missing(
    user: UserId,
    client: ClientId,
    report: &ClientMismatch,
) -> Result<(), MismatchFailure> {
    let expected: ClientMap = BTreeMap::from([(user, BTreeSet::from([client]))]);
    if report.missing == expected {
        Ok(())
    } else {
        Err(MismatchFailure {
            context: "missing clients differ".to_string(),
            expected: format!("{expected:?}"),
            actual: format!("{:?}", report.missing),
        })
    }
}
