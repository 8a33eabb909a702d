//! secp256k1 private key with WIF encoding.
//!
//! A private key carries a compression flag. The flag decides which SEC1
//! encoding its public key uses, and therefore which address it controls,
//! and it round-trips through WIF.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;

use crate::base58;
use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::network::Network;
use crate::PrimitivesError;

/// Length of a serialized private key in bytes.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// Suffix byte appended to the WIF payload of compressed keys.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 private key for signing.
#[derive(Clone, Debug)]
pub struct PrivateKey {
    /// The underlying k256 signing key.
    inner: SigningKey,
    /// Whether the matching public key is serialized compressed.
    compressed: bool,
}

impl PrivateKey {
    /// Generate a new random private key using the OS random number generator.
    ///
    /// # Returns
    /// A new compressed `PrivateKey`.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
            compressed: true,
        }
    }

    /// Create a compressed private key from a raw 32-byte scalar.
    ///
    /// # Arguments
    /// * `bytes` - A 32-byte big-endian scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` if the scalar is in `1..n`, or `InvalidPrivateKey`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_bytes(bytes.into())
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey {
            inner,
            compressed: true,
        })
    }

    /// Create a compressed private key from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Create a private key from a WIF string, ignoring its network.
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        Self::decode_wif(wif).map(|(key, _)| key)
    }

    /// Decode a WIF string into its key and the network it was encoded for.
    ///
    /// The compression flag is taken from the payload length: 33 bytes
    /// ending in 0x01 is compressed, 32 bytes is uncompressed.
    ///
    /// # Returns
    /// `(PrivateKey, Network)`, `ChecksumMismatch` for a corrupted string,
    /// or `InvalidWif` for an unknown version byte or bad length.
    pub fn decode_wif(wif: &str) -> Result<(Self, Network), PrimitivesError> {
        let (version, payload) = base58::check_decode_versioned(wif.trim()).map_err(|e| match e {
            PrimitivesError::ChecksumMismatch => e,
            other => PrimitivesError::InvalidWif(other.to_string()),
        })?;
        let network = Network::from_wif_prefix(version).ok_or_else(|| {
            PrimitivesError::InvalidWif(format!("unknown version byte 0x{:02x}", version))
        })?;
        let compressed = match payload.len() {
            33 if payload[32] == COMPRESS_MAGIC => true,
            33 => {
                return Err(PrimitivesError::InvalidWif(
                    "invalid compression flag".to_string(),
                ))
            }
            32 => false,
            n => {
                return Err(PrimitivesError::InvalidWif(format!(
                    "invalid payload length {}",
                    n
                )))
            }
        };
        let key = Self::from_bytes(&payload[..PRIVATE_KEY_BYTES_LEN])?.with_compression(compressed);
        Ok((key, network))
    }

    /// Encode the private key as WIF for `network`.
    pub fn to_wif(&self, network: Network) -> String {
        let mut payload = Vec::with_capacity(PRIVATE_KEY_BYTES_LEN + 1);
        payload.extend_from_slice(&self.to_bytes());
        if self.compressed {
            payload.push(COMPRESS_MAGIC);
        }
        base58::check_encode_versioned(network.params().wif_prefix, &payload)
    }

    /// Return the same key with the given compression flag.
    pub fn with_compression(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Whether the public key of this private key is compressed.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Serialize the private key as a 32-byte big-endian array.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Serialize the private key as a lowercase hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derive the public key, encoded according to the compression flag.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.inner.verifying_key().clone(), self.compressed)
    }

    /// Sign a 32-byte message hash with an RFC6979 deterministic nonce.
    ///
    /// # Returns
    /// A low-S `Signature`, or an error if the hash is unusable.
    pub fn sign(&self, hash: &[u8]) -> Result<Signature, PrimitivesError> {
        Signature::sign(hash, self)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes() && self.compressed == other.compressed
    }
}

impl Eq for PrivateKey {}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTERING_BITCOIN_KEY: &str =
        "18e14a7b6a307f426a94f8114701e7c8e774e7f9a47e2c2035db29a206321725";

    /// The uncompressed public key hashes to the well-known address payload.
    #[test]
    fn test_uncompressed_pub_key() {
        let key = PrivateKey::from_hex(MASTERING_BITCOIN_KEY)
            .unwrap()
            .with_compression(false);
        let pub_key = key.pub_key();
        assert!(!pub_key.is_compressed());
        assert_eq!(
            pub_key.to_hex(),
            "0450863ad64a87ae8a2fe83c1af1a8403cb53f53e486d8511dad8a04887e5b2352\
             2cd470243453a299fa9e77237716103abc11a1df38855ed6f2ee187e9c582ba6"
        );
        assert_eq!(
            hex::encode(pub_key.hash160()),
            "010966776006953d5567439e5e39f86a0d273bee"
        );
    }

    #[test]
    fn test_compressed_pub_key() {
        let key = PrivateKey::from_hex(MASTERING_BITCOIN_KEY).unwrap();
        assert!(key.is_compressed());
        assert_eq!(
            key.pub_key().to_hex(),
            "0250863ad64a87ae8a2fe83c1af1a8403cb53f53e486d8511dad8a04887e5b2352"
        );
    }

    #[test]
    fn test_wif_uncompressed_vector() {
        let (key, network) =
            PrivateKey::decode_wif("5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ").unwrap();
        assert_eq!(network, Network::Bitcoin);
        assert!(!key.is_compressed());
        assert_eq!(
            key.to_hex(),
            "0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d"
        );
        assert_eq!(
            key.to_wif(Network::Bitcoin),
            "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ"
        );
    }

    #[test]
    fn test_wif_roundtrip_both_networks() {
        let key = PrivateKey::new();
        for network in Network::ALL {
            for compressed in [true, false] {
                let k = key.clone().with_compression(compressed);
                let wif = k.to_wif(network);
                let (decoded, decoded_network) = PrivateKey::decode_wif(&wif).unwrap();
                assert_eq!(decoded, k);
                assert_eq!(decoded_network, network);
            }
        }
        assert!(key.to_wif(Network::Bitcoin).starts_with(['K', 'L']));
        assert!(key.to_wif(Network::Testnet).starts_with('c'));
    }

    #[test]
    fn test_private_key_from_invalid_input() {
        assert!(PrivateKey::from_hex("").is_err());
        assert!(PrivateKey::from_hex("zz").is_err());
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
        assert!(PrivateKey::from_bytes(&[1u8; 31]).is_err());
    }

    #[test]
    fn test_private_key_from_invalid_wif() {
        // modified character
        assert!(PrivateKey::from_wif("5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTj").is_err());
        // truncated
        assert!(PrivateKey::from_wif("5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyT").is_err());
        // not base58
        assert!(PrivateKey::from_wif("0OIl").is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let key = PrivateKey::from_hex(MASTERING_BITCOIN_KEY).unwrap();
        let hash = crate::hash::sha256d(b"txkit");
        let sig = key.sign(&hash).unwrap();
        assert!(key.pub_key().verify(&hash, &sig));
        assert!(key.clone().with_compression(false).pub_key().verify(&hash, &sig));
    }
}
