//! Opaque key-material capabilities consumed by the wire codec.
//!
//! Asset keys, access tokens, and symmetric key bundles are owned by external
//! collaborators (asset store, crypto stack). The codec only needs their
//! canonical byte form, so they are modeled as a narrow parse/serialize
//! capability and the codec stays testable with fakes.

use std::fmt::Debug;

/// Canonical byte-form capability.
///
/// `to_bytes` must produce the external canonical representation and
/// `from_bytes` must accept exactly that representation back. For the
/// symmetric key bundle this encoding is self-delimiting: it is the last
/// field of an asset descriptor and receives the entire remainder of the
/// input.
pub trait ByteForm: Sized + Debug + PartialEq {
    /// Parse failure reported by the external collaborator.
    type Error: std::error::Error;

    /// Serialize to the canonical byte representation.
    fn to_bytes(&self) -> Vec<u8>;

    /// Parse from the canonical byte representation.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}
