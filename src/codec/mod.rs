//! Bot message wire codec.
//!
//! Encodes and decodes the two-variant message payload exchanged between
//! bots. The payload travels as an opaque binary blob inside whatever frame
//! the transport provides.
//!
//! # Wire Format
//!
//! ```text
//! +-----+--------------------------------------+
//! | tag | payload                              |
//! +-----+--------------------------------------+
//!   0x01  UTF-8 text, to end of input
//!   0x02  asset descriptor (see codec::asset)
//! ```
//!
//! There is no outer length prefix: the text variant greedily consumes all
//! remaining bytes. The codec is therefore only applicable to the *entire*
//! payload of a transport frame, never to one field among several. This is a
//! wire-compatibility constraint; adding a length prefix would break the
//! format.
//!
//! For text-based transports (JSON fields, HTTP headers) use
//! [`BotMessage::encode_str`] / [`BotMessage::decode_str`], which wrap the
//! binary form in base64.

pub mod asset;
pub mod material;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::BufMut;
use thiserror::Error;

pub use asset::AssetInfo;
pub use material::ByteForm;

use crate::error::{HarnessError, Result};

/// Wire tag for the text variant.
pub const TAG_TEXT: u8 = 1;

/// Wire tag for the asset variant.
pub const TAG_ASSET: u8 = 2;

/// Wire decode failures. Local and recoverable, never a panic.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// First byte is not a known variant tag.
    #[error("unknown message tag {0:#04x}")]
    UnknownTag(u8),

    /// Text payload is not valid UTF-8.
    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    /// A length prefix exceeds the remaining input.
    #[error("truncated input: need {need} bytes, {have} remaining")]
    Truncated {
        /// Bytes the format requires next.
        need: usize,
        /// Bytes actually remaining.
        have: usize,
    },

    /// Asset key bytes were rejected by the external key parser.
    #[error("invalid asset key: {0}")]
    InvalidAssetKey(String),

    /// Asset token bytes were rejected by the external token parser.
    #[error("invalid asset token: {0}")]
    InvalidAssetToken(String),

    /// Symmetric key bundle failed to decode.
    #[error("invalid symmetric key bundle: {0}")]
    InvalidKeyBundle(String),

    /// Text-transport wrapper (base64) failed to decode.
    #[error("transport encoding error: {0}")]
    Transport(String),
}

/// Wire encode failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// A length-prefixed field exceeds the 16-bit prefix.
    #[error("{field} is {len} bytes, exceeding the 16-bit length prefix")]
    FieldTooLong {
        /// Which field overflowed.
        field: &'static str,
        /// Actual byte length.
        len: usize,
    },

    /// Asset keys are required to be non-empty.
    #[error("asset key must not be empty")]
    EmptyAssetKey,

    /// A present token must serialize to at least one byte, since a
    /// zero-length field means "absent" on the wire.
    #[error("present asset token serialized to zero bytes")]
    EmptyAssetToken,
}

/// A typed bot message payload.
///
/// Generic over the externally owned key material (see [`material`]); the
/// wire tag uniquely determines the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum BotMessage<K, T, B> {
    /// Plain text message.
    Text(String),
    /// Reference to an uploaded asset plus its decryption material.
    Asset(AssetInfo<K, T, B>),
}

impl<K, T, B> BotMessage<K, T, B>
where
    K: ByteForm,
    T: ByteForm,
    B: ByteForm,
{
    /// Create a text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an asset message.
    pub fn asset(key: K, token: Option<T>, keys: B) -> Self {
        Self::Asset(AssetInfo::new(key, token, keys))
    }

    /// Encode to wire format bytes.
    pub fn encode(&self) -> std::result::Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::with_capacity(64);
        match self {
            Self::Text(text) => {
                buf.put_u8(TAG_TEXT);
                buf.put_slice(text.as_bytes());
            }
            Self::Asset(info) => {
                buf.put_u8(TAG_ASSET);
                info.write_into(&mut buf)?;
            }
        }
        Ok(buf)
    }

    /// Decode from wire format bytes, consuming the entire input.
    pub fn decode(data: &[u8]) -> std::result::Result<Self, DecodeError> {
        let (&tag, rest) = data
            .split_first()
            .ok_or(DecodeError::Truncated { need: 1, have: 0 })?;
        match tag {
            TAG_TEXT => {
                let text = std::str::from_utf8(rest).map_err(|_| DecodeError::InvalidUtf8)?;
                Ok(Self::Text(text.to_owned()))
            }
            TAG_ASSET => Ok(Self::Asset(AssetInfo::read_from(rest)?)),
            other => Err(DecodeError::UnknownTag(other)),
        }
    }

    /// Encode to a base64 string for text-based transports.
    pub fn encode_str(&self) -> std::result::Result<String, EncodeError> {
        Ok(BASE64.encode(self.encode()?))
    }

    /// Decode from the base64 text-transport form.
    pub fn decode_str(data: &str) -> std::result::Result<Self, DecodeError> {
        let raw = BASE64
            .decode(data)
            .map_err(|e| DecodeError::Transport(e.to_string()))?;
        Self::decode(&raw)
    }
}

/// Decode `data` and require the text variant.
///
/// Fails with [`HarnessError::RequirementFailed`] if an asset message is
/// present instead.
pub fn require_text(data: &[u8]) -> Result<String> {
    match data.split_first() {
        Some((&TAG_TEXT, rest)) => Ok(std::str::from_utf8(rest)
            .map_err(|_| DecodeError::InvalidUtf8)?
            .to_owned()),
        Some((&TAG_ASSET, _)) => Err(HarnessError::RequirementFailed {
            expected: "text",
            actual: "asset",
        }),
        Some((&other, _)) => Err(DecodeError::UnknownTag(other).into()),
        None => Err(DecodeError::Truncated { need: 1, have: 0 }.into()),
    }
}

/// Decode `data` and require the asset variant.
///
/// Fails with [`HarnessError::RequirementFailed`] if a text message is
/// present instead.
pub fn require_asset<K, T, B>(data: &[u8]) -> Result<AssetInfo<K, T, B>>
where
    K: ByteForm,
    T: ByteForm,
    B: ByteForm,
{
    match BotMessage::<K, T, B>::decode(data)? {
        BotMessage::Asset(info) => Ok(info),
        BotMessage::Text(_) => Err(HarnessError::RequirementFailed {
            expected: "asset",
            actual: "text",
        }),
    }
}
