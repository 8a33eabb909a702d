//! secp256k1 public key that remembers its SEC1 encoding.
//!
//! Compressed and uncompressed encodings of the same point hash to
//! different addresses, so a key parsed from a script keeps the form it
//! arrived in and serializes back to exactly those bytes.

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use std::fmt;

use crate::ec::signature::Signature;
use crate::hash::hash160;
use crate::PrimitivesError;

/// Length of a compressed public key in bytes (prefix + 32 byte x-coordinate).
pub const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed public key in bytes (prefix + 32 byte x + 32 byte y).
pub const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key.
///
/// Equality compares the encoded bytes; use [`PublicKey::same_point`] to
/// compare keys regardless of encoding.
#[derive(Clone, Debug)]
pub struct PublicKey {
    /// The underlying k256 verifying key.
    inner: VerifyingKey,
    /// Whether this key serializes in 33-byte form.
    compressed: bool,
}

impl PublicKey {
    /// Parse a SEC1-encoded public key.
    ///
    /// Accepts 33-byte keys with prefix 0x02/0x03 and 65-byte keys with
    /// prefix 0x04.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or `InvalidPublicKey` if the bytes are
    /// not a point on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let compressed = match (bytes.len(), bytes.first().copied()) {
            (COMPRESSED_LEN, Some(0x02 | 0x03)) => true,
            (UNCOMPRESSED_LEN, Some(0x04)) => false,
            (0, _) => {
                return Err(PrimitivesError::InvalidPublicKey(
                    "public key is empty".to_string(),
                ))
            }
            (len, prefix) => {
                return Err(PrimitivesError::InvalidPublicKey(format!(
                    "unsupported encoding: {} bytes with prefix 0x{:02x}",
                    len,
                    prefix.unwrap_or_default()
                )))
            }
        };
        let inner = VerifyingKey::from_sec1_bytes(bytes)?;
        Ok(PublicKey { inner, compressed })
    }

    /// Parse a hex-encoded SEC1 public key.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    pub(crate) fn from_verifying_key(inner: VerifyingKey, compressed: bool) -> Self {
        PublicKey { inner, compressed }
    }

    /// Whether this key serializes in compressed form.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Serialize the key in the encoding it was created with.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner
            .to_encoded_point(self.compressed)
            .as_bytes()
            .to_vec()
    }

    /// Serialize the public key in compressed SEC1 format (33 bytes).
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize the public key in uncompressed SEC1 format (65 bytes).
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Hex of [`PublicKey::to_bytes`].
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Compute Hash160 of the key's own encoding.
    ///
    /// # Returns
    /// The 20-byte RIPEMD160(SHA256(key)) digest used by P2PKH scripts.
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.to_bytes())
    }

    /// Whether both keys are the same curve point.
    pub fn same_point(&self, other: &PublicKey) -> bool {
        self.to_compressed() == other.to_compressed()
    }

    /// Verify an ECDSA signature over a 32-byte message hash.
    pub fn verify(&self, hash: &[u8], sig: &Signature) -> bool {
        sig.verify(hash, self)
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.compressed == other.compressed && self.same_point(other)
    }
}

impl Eq for PublicKey {}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
