//! # Botlink - Bot Scenario Harness
//!
//! Simulation harness for establishing peer relationships and group
//! conversations between autonomous agents ("bots") on a messaging platform,
//! and for exchanging typed messages whose payload travels as an opaque
//! binary blob.
//!
//! ## Features
//!
//! - **Connection negotiation**: bounded-retry state machine driving every
//!   pair of a bot group from "unconnected" to "connected"
//! - **Conversation provisioning**: locate the 1:1 conversation for a pair,
//!   or create a group conversation for three or more bots
//! - **Binary wire codec**: compact two-variant payload format (plain text,
//!   or an asset reference with symmetric decryption material)
//! - **Mismatch validation**: pure checks over the client mismatch reports
//!   that encrypted message sends return
//! - **In-memory simulation**: a fake service backend so whole scenarios run
//!   in-process
//!
//! ## Architecture
//!
//! ```text
//!  scenario author
//!       |
//!       |  prepare_conv(bots)
//!       v
//!  Conversation Provisioner ----> Connection Negotiator (per pair)
//!       |                              |
//!       |                              |  status / request / accept
//!       v                              v
//!  +---------------- Sessions trait (one remote call each) -------------+
//!  |              external messaging service (or sim::InMemoryService)  |
//!  +--------------------------------------------------------------------+
//!
//!  Wire Codec / Asset Descriptor: used independently by whoever sends or
//!  receives a message payload in the provisioned conversation.
//! ```
//!
//! ## Connect State Machine
//!
//! Per unordered pair, at most 6 attempts, the driving role swapping on each
//! attempt:
//!
//! ```text
//!   driver sees NoRelation ──> send request, check ──> swap roles, retry
//!   driver sees Pending    ──> accept, check       ──> connected
//!   driver sees Sent       ──> counterpart's turn  ──> swap roles, retry
//!   driver sees anything else (already resolved)   ──> connected
//! ```
//!
//! Exhausting the budget gives up silently; the downstream conversation
//! lookup is the step that fails if connection never completed.
//!
//! ## Wire Format
//!
//! | Tag  | Variant | Payload                                              |
//! |------|---------|------------------------------------------------------|
//! | 0x01 | Text    | UTF-8 bytes, greedily to end of input                |
//! | 0x02 | Asset   | `u16 L1` + key, `u16 L2` + token (0 = absent), bundle |
//!
//! The text variant has no length prefix, so the codec applies only to the
//! entire payload of a transport frame.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use botlink::config::Config;
//! use botlink::protocol::{prepare_conv, Bot, BotId};
//! use botlink::sim::{InMemoryService, SimMessage};
//!
//! let mut service = InMemoryService::new();
//! let bots: Vec<Bot> = (0..3).map(|_| Bot::new(BotId::random())).collect();
//!
//! // Negotiate all pairs, then create the group conversation.
//! let conv = prepare_conv(&mut service, &Config::default(), &bots).unwrap();
//!
//! // Exchange a payload.
//! let wire = SimMessage::text("hello everyone").encode().unwrap();
//! let received = SimMessage::decode(&wire).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`codec`]: wire codec and asset descriptor
//! - [`protocol`]: connection negotiation, conversation provisioning,
//!   mismatch validation, session-execution interface
//! - [`config`]: harness configuration
//! - [`sim`]: in-memory service fake and simulated key material
//! - [`error`]: error types and result alias

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod sim;

// Re-exports for convenience
pub use codec::{require_asset, require_text, AssetInfo, BotMessage, ByteForm, DecodeError, EncodeError};
pub use config::Config;
pub use error::{HarnessError, Result};
pub use protocol::{
    assert_client_missing, assert_no_mismatch, connect_pair, prepare_conv, Bot, BotId, ClientId,
    ClientMismatch, Connectedness, ConvId, MismatchFailure, RelationStatus, Sessions, UserId,
    CONNECT_ATTEMPTS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
