//! Bot identities and the session-execution interface.
//!
//! All remote state lives in the external messaging service. This crate only
//! observes and mutates it through [`Sessions`], whose methods each stand for
//! one blocking remote round trip executed as the acting bot. Implementations
//! wrap the real service plumbing; [`crate::sim::InMemoryService`] provides an
//! in-process fake for scenario tests.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::connect::RelationStatus;
use crate::error::Result;

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(
    /// Stable identity of a bot.
    BotId
);
id_newtype!(
    /// User identity as reported by the service (e.g. in mismatch reports).
    UserId
);
id_newtype!(
    /// Per-device client identity.
    ClientId
);
id_newtype!(
    /// Conversation identity.
    ConvId
);

/// An autonomous test identity.
///
/// Owned by the external bot framework; this crate reads only the stable id
/// and the optional contact address used when initiating a connection
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bot {
    /// Stable identity, comparable for equality.
    pub id: BotId,
    /// Contact address (e.g. email), if the identity has one.
    pub email: Option<String>,
}

impl Bot {
    /// Create a bot without a contact address.
    pub fn new(id: BotId) -> Self {
        Self { id, email: None }
    }

    /// Create a bot with a contact address.
    pub fn with_email(id: BotId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: Some(email.into()),
        }
    }

    /// Contact address for outgoing connection requests, empty if absent.
    pub fn address(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

/// Session-execution interface to the external messaging service.
///
/// Every method runs one remote operation as `actor` and blocks until the
/// round trip completes. The `assert_*` methods are post-condition checks
/// against service state; their failure aborts the enclosing scenario as
/// [`crate::error::HarnessError::Postcondition`].
pub trait Sessions {
    /// Query the relation between `actor` and `other`, as seen by `actor`.
    fn relation_status(&mut self, actor: &Bot, other: BotId) -> Result<RelationStatus>;

    /// Send a connection request from `actor` to `other`.
    fn request_connection(
        &mut self,
        actor: &Bot,
        other: BotId,
        address: &str,
        greeting: &str,
    ) -> Result<()>;

    /// Accept the pending connection request `other` sent to `actor`.
    fn accept_connection(&mut self, actor: &Bot, other: BotId) -> Result<()>;

    /// Look up the 1:1 conversation tied to `actor`'s connection to `other`.
    fn conversation_with(&mut self, actor: &Bot, other: BotId) -> Result<Option<ConvId>>;

    /// Create a group conversation owned by `actor` with the given initial
    /// members.
    fn create_group(&mut self, actor: &Bot, name: &str, members: &[BotId]) -> Result<ConvId>;

    /// Check that the service recorded a connection request from `from` to
    /// `to`.
    fn assert_connect_requested(&mut self, from: BotId, to: BotId) -> Result<()>;

    /// Check that the service recorded `from` accepting `to`'s request.
    fn assert_connect_accepted(&mut self, from: BotId, to: BotId) -> Result<()>;

    /// Check that `conv` exists and contains every listed member.
    fn assert_conversation_created(&mut self, conv: ConvId, members: &[BotId]) -> Result<()>;
}
