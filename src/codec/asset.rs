//! Asset descriptor encoding and decoding.
//!
//! An asset message carries a reference to a stored binary object together
//! with the key material needed to decrypt it. The descriptor has a fixed
//! big-endian layout:
//!
//! ```text
//! +----+----------+----+------------+-------------------------+
//! | L1 | key      | L2 | token      | symmetric key bundle    |
//! | u16| L1 bytes | u16| L2 bytes   | remainder of input      |
//! +----+----------+----+------------+-------------------------+
//! ```
//!
//! An absent access token is a zero-length field (`L2 = 0`), not a sentinel
//! byte. Field lengths are capped by the 16-bit prefix; this is a hard format
//! constraint, not a configurable limit.

use bytes::BufMut;

use super::material::ByteForm;
use super::{DecodeError, EncodeError};

/// Reference to a stored asset plus the material needed to decrypt it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo<K, T, B> {
    /// Opaque identifier of the stored asset. Always present and non-empty.
    pub key: K,
    /// Access token gating the asset, if the asset is token-gated.
    pub token: Option<T>,
    /// Symmetric key bundle for decrypting the asset contents.
    pub keys: B,
}

impl<K, T, B> AssetInfo<K, T, B>
where
    K: ByteForm,
    T: ByteForm,
    B: ByteForm,
{
    /// Create a descriptor.
    pub fn new(key: K, token: Option<T>, keys: B) -> Self {
        Self { key, token, keys }
    }

    /// Append the wire encoding of this descriptor to `buf`.
    pub(crate) fn write_into(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        let key = self.key.to_bytes();
        if key.is_empty() {
            return Err(EncodeError::EmptyAssetKey);
        }
        write_prefixed(buf, "asset key", &key)?;

        match &self.token {
            Some(token) => {
                let token = token.to_bytes();
                if token.is_empty() {
                    // A zero-length token field means "absent" on the wire and
                    // would not round-trip back to Some.
                    return Err(EncodeError::EmptyAssetToken);
                }
                write_prefixed(buf, "asset token", &token)?;
            }
            None => buf.put_u16(0),
        }

        buf.put_slice(&self.keys.to_bytes());
        Ok(())
    }

    /// Decode a descriptor from `data`, consuming the entire input.
    pub(crate) fn read_from(mut data: &[u8]) -> Result<Self, DecodeError> {
        let key_bytes = read_prefixed(&mut data)?;
        if key_bytes.is_empty() {
            return Err(DecodeError::InvalidAssetKey(
                "zero-length key field".to_string(),
            ));
        }
        let key =
            K::from_bytes(key_bytes).map_err(|e| DecodeError::InvalidAssetKey(e.to_string()))?;

        let token_bytes = read_prefixed(&mut data)?;
        let token = if token_bytes.is_empty() {
            None
        } else {
            Some(
                T::from_bytes(token_bytes)
                    .map_err(|e| DecodeError::InvalidAssetToken(e.to_string()))?,
            )
        };

        // The bundle encoding is self-delimiting and owns the remainder.
        let keys =
            B::from_bytes(data).map_err(|e| DecodeError::InvalidKeyBundle(e.to_string()))?;

        Ok(Self { key, token, keys })
    }
}

/// Write a u16 length prefix followed by the field bytes.
fn write_prefixed(buf: &mut Vec<u8>, field: &'static str, bytes: &[u8]) -> Result<(), EncodeError> {
    if bytes.len() > usize::from(u16::MAX) {
        return Err(EncodeError::FieldTooLong {
            field,
            len: bytes.len(),
        });
    }
    buf.put_u16(bytes.len() as u16);
    buf.put_slice(bytes);
    Ok(())
}

/// Read a u16 length prefix and split off that many field bytes.
fn read_prefixed<'a>(data: &mut &'a [u8]) -> Result<&'a [u8], DecodeError> {
    if data.len() < 2 {
        return Err(DecodeError::Truncated {
            need: 2,
            have: data.len(),
        });
    }
    let len = usize::from(u16::from_be_bytes([data[0], data[1]]));
    let rest = &data[2..];
    if rest.len() < len {
        return Err(DecodeError::Truncated {
            need: len,
            have: rest.len(),
        });
    }
    let (field, tail) = rest.split_at(len);
    *data = tail;
    Ok(field)
}
