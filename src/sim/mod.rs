//! In-process simulation of the remote messaging service.
//!
//! [`InMemoryService`] implements [`Sessions`] against plain in-memory state:
//! per-pair relation tracking, 1:1 conversations provisioned on acceptance,
//! and group rosters. Scenario tests run against it instead of a live
//! backend, and the crate's own negotiator and provisioner tests use it to
//! observe remote-call counts.
//!
//! The module also provides fake key material ([`SimAssetKey`],
//! [`SimAssetToken`], [`SimKeyBundle`]) implementing the codec's [`ByteForm`]
//! capability, so whole scenarios can encode and decode asset messages
//! without a real asset store or crypto stack.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tracing::debug;

use crate::codec::{BotMessage, ByteForm};
use crate::error::{HarnessError, Result};
use crate::protocol::session::{Bot, BotId, ConvId, Sessions};
use crate::protocol::RelationStatus;

/// Unordered pair key, normalized so both directions hit the same entry.
type PairKey = (BotId, BotId);

fn pair(a: BotId, b: BotId) -> PairKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Relation state held by the simulated service for one pair.
#[derive(Debug, Default)]
struct Relation {
    /// Sides that have sent a connection request.
    requested: BTreeSet<BotId>,
    /// True once either side accepted.
    connected: bool,
    /// Sides that blocked the counterpart.
    blocked_by: BTreeSet<BotId>,
}

/// One recorded connection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Sender of the request.
    pub from: BotId,
    /// Addressee.
    pub to: BotId,
    /// Contact address the sender supplied (may be empty).
    pub address: String,
    /// Greeting payload.
    pub greeting: String,
}

/// Remote-call counters, one per [`Sessions`] operation kind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallCounts {
    /// Relation status queries.
    pub status_queries: usize,
    /// Connection requests sent.
    pub requests: usize,
    /// Connection acceptances.
    pub accepts: usize,
    /// 1:1 conversation lookups.
    pub conv_lookups: usize,
    /// Group conversation creations.
    pub group_creates: usize,
}

#[derive(Debug)]
struct Group {
    name: String,
    members: Vec<BotId>,
}

/// In-memory fake of the remote messaging service.
#[derive(Debug, Default)]
pub struct InMemoryService {
    relations: HashMap<PairKey, Relation>,
    one_to_one: HashMap<PairKey, ConvId>,
    groups: HashMap<ConvId, Group>,
    request_log: Vec<ConnectionRequest>,
    counts: CallCounts,
    freeze_pending: bool,
}

impl InMemoryService {
    /// Fresh service with no relations or conversations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Service that never surfaces a sent request as `Pending` to the
    /// counterpart. Pairs can never converge; used to exercise the
    /// negotiator's retry bound.
    pub fn with_frozen_pending() -> Self {
        Self {
            freeze_pending: true,
            ..Self::default()
        }
    }

    /// Remote-call counters accumulated so far.
    pub fn counts(&self) -> &CallCounts {
        &self.counts
    }

    /// Every connection request recorded, in order.
    pub fn requests(&self) -> &[ConnectionRequest] {
        &self.request_log
    }

    /// Roster of a group conversation, if it exists.
    pub fn group_members(&self, conv: ConvId) -> Option<Vec<BotId>> {
        self.groups.get(&conv).map(|g| g.members.clone())
    }

    /// Name of a group conversation, if it exists.
    pub fn group_name(&self, conv: ConvId) -> Option<&str> {
        self.groups.get(&conv).map(|g| g.name.as_str())
    }

    /// Mark `other` as blocked by `actor`. Test scaffolding for relations
    /// that resolved outside the negotiation flow.
    pub fn block(&mut self, actor: &Bot, other: BotId) {
        self.relations
            .entry(pair(actor.id, other))
            .or_default()
            .blocked_by
            .insert(actor.id);
    }

    fn relation(&self, a: BotId, b: BotId) -> Option<&Relation> {
        self.relations.get(&pair(a, b))
    }
}

impl Sessions for InMemoryService {
    fn relation_status(&mut self, actor: &Bot, other: BotId) -> Result<RelationStatus> {
        self.counts.status_queries += 1;
        let status = match self.relation(actor.id, other) {
            Some(rel) if rel.blocked_by.contains(&actor.id) => RelationStatus::Blocked,
            Some(rel) if rel.connected => RelationStatus::Connected,
            Some(rel) if rel.requested.contains(&actor.id) => RelationStatus::Sent,
            Some(rel) if rel.requested.contains(&other) => {
                if self.freeze_pending {
                    RelationStatus::NoRelation
                } else {
                    RelationStatus::Pending
                }
            }
            _ => RelationStatus::NoRelation,
        };
        Ok(status)
    }

    fn request_connection(
        &mut self,
        actor: &Bot,
        other: BotId,
        address: &str,
        greeting: &str,
    ) -> Result<()> {
        self.counts.requests += 1;
        self.relations
            .entry(pair(actor.id, other))
            .or_default()
            .requested
            .insert(actor.id);
        self.request_log.push(ConnectionRequest {
            from: actor.id,
            to: other,
            address: address.to_string(),
            greeting: greeting.to_string(),
        });
        debug!(from = %actor.id, to = %other, "sim: connection requested");
        Ok(())
    }

    fn accept_connection(&mut self, actor: &Bot, other: BotId) -> Result<()> {
        self.counts.accepts += 1;
        let key = pair(actor.id, other);
        let rel = self
            .relations
            .get_mut(&key)
            .filter(|rel| rel.requested.contains(&other))
            .ok_or_else(|| {
                HarnessError::Session(format!("no pending request from {other} to {}", actor.id))
            })?;
        rel.connected = true;

        // Acceptance provisions the 1:1 conversation as a side effect.
        self.one_to_one.entry(key).or_insert_with(ConvId::random);
        debug!(by = %actor.id, with = %other, "sim: connection accepted");
        Ok(())
    }

    fn conversation_with(&mut self, actor: &Bot, other: BotId) -> Result<Option<ConvId>> {
        self.counts.conv_lookups += 1;
        Ok(self.one_to_one.get(&pair(actor.id, other)).copied())
    }

    fn create_group(&mut self, actor: &Bot, name: &str, members: &[BotId]) -> Result<ConvId> {
        self.counts.group_creates += 1;
        let conv = ConvId::random();
        let mut roster = vec![actor.id];
        roster.extend_from_slice(members);
        self.groups.insert(
            conv,
            Group {
                name: name.to_string(),
                members: roster,
            },
        );
        debug!(%conv, owner = %actor.id, members = members.len(), "sim: group created");
        Ok(conv)
    }

    fn assert_connect_requested(&mut self, from: BotId, to: BotId) -> Result<()> {
        match self.relation(from, to) {
            Some(rel) if rel.requested.contains(&from) => Ok(()),
            _ => Err(HarnessError::Postcondition(format!(
                "no connection request recorded from {from} to {to}"
            ))),
        }
    }

    fn assert_connect_accepted(&mut self, from: BotId, to: BotId) -> Result<()> {
        match self.relation(from, to) {
            Some(rel) if rel.connected => Ok(()),
            _ => Err(HarnessError::Postcondition(format!(
                "connection between {from} and {to} is not accepted"
            ))),
        }
    }

    fn assert_conversation_created(&mut self, conv: ConvId, members: &[BotId]) -> Result<()> {
        let group = self.groups.get(&conv).ok_or_else(|| {
            HarnessError::Postcondition(format!("conversation {conv} was not created"))
        })?;
        for member in members {
            if !group.members.contains(member) {
                return Err(HarnessError::Postcondition(format!(
                    "bot {member} is not a member of conversation {conv}"
                )));
            }
        }
        Ok(())
    }
}

/// Parse failures of the fake key material.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SimMaterialError {
    /// Bytes were not valid UTF-8.
    #[error("not valid UTF-8")]
    Utf8,
    /// A value that must be non-empty was empty.
    #[error("empty value")]
    Empty,
    /// A fixed-size encoding had the wrong length.
    #[error("expected {expected} bytes, got {got}")]
    BadLength {
        /// Required byte count.
        expected: usize,
        /// Byte count actually present.
        got: usize,
    },
}

/// Fake asset key: a plain textual identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimAssetKey(pub String);

impl ByteForm for SimAssetKey {
    type Error = SimMaterialError;

    fn to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        if bytes.is_empty() {
            return Err(SimMaterialError::Empty);
        }
        let text = std::str::from_utf8(bytes).map_err(|_| SimMaterialError::Utf8)?;
        Ok(Self(text.to_owned()))
    }
}

/// Fake asset access token: a plain textual token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimAssetToken(pub String);

impl ByteForm for SimAssetToken {
    type Error = SimMaterialError;

    fn to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        let text = std::str::from_utf8(bytes).map_err(|_| SimMaterialError::Utf8)?;
        Ok(Self(text.to_owned()))
    }
}

/// Size of the fake symmetric key bundle encoding.
pub const SIM_BUNDLE_LEN: usize = 64;

/// Fake symmetric key bundle: a 32-byte cipher key plus a 32-byte digest,
/// encoded as their fixed-size concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimKeyBundle {
    /// Symmetric cipher key.
    pub otr_key: [u8; 32],
    /// SHA-256 of the encrypted asset.
    pub sha256: [u8; 32],
}

impl ByteForm for SimKeyBundle {
    type Error = SimMaterialError;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SIM_BUNDLE_LEN);
        buf.extend_from_slice(&self.otr_key);
        buf.extend_from_slice(&self.sha256);
        buf
    }

    fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        if bytes.len() != SIM_BUNDLE_LEN {
            return Err(SimMaterialError::BadLength {
                expected: SIM_BUNDLE_LEN,
                got: bytes.len(),
            });
        }
        let mut otr_key = [0u8; 32];
        let mut sha256 = [0u8; 32];
        otr_key.copy_from_slice(&bytes[..32]);
        sha256.copy_from_slice(&bytes[32..]);
        Ok(Self { otr_key, sha256 })
    }
}

/// Bot message specialized to the simulated key material.
pub type SimMessage = BotMessage<SimAssetKey, SimAssetToken, SimKeyBundle>;

#[cfg(test)]
mod tests {
    use super::*;

    fn bot() -> Bot {
        Bot::new(BotId::random())
    }

    #[test]
    fn test_relation_lifecycle() {
        let mut sim = InMemoryService::new();
        let a = bot();
        let b = bot();

        assert_eq!(
            sim.relation_status(&a, b.id).unwrap(),
            RelationStatus::NoRelation
        );

        sim.request_connection(&a, b.id, "a@example.com", "hi").unwrap();
        assert_eq!(sim.relation_status(&a, b.id).unwrap(), RelationStatus::Sent);
        assert_eq!(
            sim.relation_status(&b, a.id).unwrap(),
            RelationStatus::Pending
        );
        sim.assert_connect_requested(a.id, b.id).unwrap();

        sim.accept_connection(&b, a.id).unwrap();
        assert_eq!(
            sim.relation_status(&a, b.id).unwrap(),
            RelationStatus::Connected
        );
        sim.assert_connect_accepted(b.id, a.id).unwrap();

        // Acceptance provisioned the 1:1 conversation for both directions.
        let conv_a = sim.conversation_with(&a, b.id).unwrap().unwrap();
        let conv_b = sim.conversation_with(&b, a.id).unwrap().unwrap();
        assert_eq!(conv_a, conv_b);
    }

    #[test]
    fn test_accept_without_request_fails() {
        let mut sim = InMemoryService::new();
        let a = bot();
        let b = bot();
        let err = sim.accept_connection(&a, b.id).unwrap_err();
        assert!(matches!(err, HarnessError::Session(_)));
    }

    #[test]
    fn test_frozen_pending_hides_incoming_request() {
        let mut sim = InMemoryService::with_frozen_pending();
        let a = bot();
        let b = bot();
        sim.request_connection(&a, b.id, "", "hi").unwrap();

        assert_eq!(sim.relation_status(&a, b.id).unwrap(), RelationStatus::Sent);
        assert_eq!(
            sim.relation_status(&b, a.id).unwrap(),
            RelationStatus::NoRelation
        );
    }

    #[test]
    fn test_block_overrides_relation_status() {
        let mut sim = InMemoryService::new();
        let a = bot();
        let b = bot();
        sim.request_connection(&b, a.id, "", "hi").unwrap();

        sim.block(&a, b.id);
        assert_eq!(
            sim.relation_status(&a, b.id).unwrap(),
            RelationStatus::Blocked
        );
        // The blocking side's view; the counterpart still sees its request.
        assert_eq!(sim.relation_status(&b, a.id).unwrap(), RelationStatus::Sent);
    }

    #[test]
    fn test_request_log_records_address_and_greeting() {
        let mut sim = InMemoryService::new();
        let a = Bot::with_email(BotId::random(), "a@example.com");
        let b = bot();
        sim.request_connection(&a, b.id, a.address(), "join me").unwrap();

        assert_eq!(
            sim.requests(),
            &[ConnectionRequest {
                from: a.id,
                to: b.id,
                address: "a@example.com".to_string(),
                greeting: "join me".to_string(),
            }]
        );
    }

    #[test]
    fn test_group_roster_includes_owner() {
        let mut sim = InMemoryService::new();
        let owner = bot();
        let members = [BotId::random(), BotId::random()];
        let conv = sim.create_group(&owner, "room", &members).unwrap();

        sim.assert_conversation_created(conv, &members).unwrap();
        let roster = sim.group_members(conv).unwrap();
        assert!(roster.contains(&owner.id));
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn test_assert_conversation_rejects_stranger() {
        let mut sim = InMemoryService::new();
        let owner = bot();
        let conv = sim.create_group(&owner, "room", &[BotId::random()]).unwrap();
        let err = sim
            .assert_conversation_created(conv, &[BotId::random()])
            .unwrap_err();
        assert!(matches!(err, HarnessError::Postcondition(_)));
    }

    #[test]
    fn test_bundle_byte_form() {
        let bundle = SimKeyBundle {
            otr_key: [1; 32],
            sha256: [2; 32],
        };
        let bytes = bundle.to_bytes();
        assert_eq!(bytes.len(), SIM_BUNDLE_LEN);
        assert_eq!(SimKeyBundle::from_bytes(&bytes).unwrap(), bundle);
        assert_eq!(
            SimKeyBundle::from_bytes(&bytes[..63]).unwrap_err(),
            SimMaterialError::BadLength {
                expected: SIM_BUNDLE_LEN,
                got: 63
            }
        );
    }

    #[test]
    fn test_key_material_rejects_bad_bytes() {
        assert_eq!(
            SimAssetKey::from_bytes(&[]).unwrap_err(),
            SimMaterialError::Empty
        );
        assert_eq!(
            SimAssetKey::from_bytes(&[0xFF, 0xFE]).unwrap_err(),
            SimMaterialError::Utf8
        );
    }
}
