//! ECDSA signature with strict DER serialization.
//!
//! Signing uses RFC6979 deterministic nonces and always produces low-S
//! signatures. Verification accepts high-S signatures by normalizing them
//! first, since transactions signed before low-S was enforced carry them.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// Shortest possible DER signature: two one-byte integers.
const MIN_DER_LEN: usize = 8;

/// Longest possible DER signature: two 33-byte integers.
const MAX_DER_LEN: usize = 72;

/// An ECDSA signature over secp256k1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    inner: ecdsa::Signature,
}

impl Signature {
    /// Create a signature from big-endian R and S values.
    ///
    /// # Returns
    /// `Ok(Signature)` if both values are in `1..n`, or `InvalidSignature`.
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Result<Self, PrimitivesError> {
        let inner = ecdsa::Signature::from_scalars(k256::FieldBytes::from(r), k256::FieldBytes::from(s))
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(Signature { inner })
    }

    /// The R component as 32 big-endian bytes.
    pub fn r(&self) -> [u8; 32] {
        let (r, _) = self.inner.split_bytes();
        let mut out = [0u8; 32];
        out.copy_from_slice(&r);
        out
    }

    /// The S component as 32 big-endian bytes.
    pub fn s(&self) -> [u8; 32] {
        let (_, s) = self.inner.split_bytes();
        let mut out = [0u8; 32];
        out.copy_from_slice(&s);
        out
    }

    /// Whether S is in the lower half of the curve order.
    pub fn is_low_s(&self) -> bool {
        self.inner.normalize_s().is_none()
    }

    /// Parse a strictly DER-encoded signature (no trailing sighash byte).
    ///
    /// Layout: `0x30 <len> 0x02 <r_len> <r> 0x02 <s_len> <s>`. Integers must
    /// be positive and minimally encoded, and `<len>` must cover the rest of
    /// the input exactly.
    ///
    /// # Returns
    /// `Ok(Signature)` on success, or `InvalidSignature` naming the rule
    /// that failed.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() < MIN_DER_LEN || bytes.len() > MAX_DER_LEN {
            return Err(malformed("bad length"));
        }
        if bytes[0] != 0x30 {
            return Err(malformed("no sequence marker"));
        }
        if bytes[1] as usize != bytes.len() - 2 {
            return Err(malformed("sequence length mismatch"));
        }

        let r_len = bytes[3] as usize;
        if bytes[2] != 0x02 || r_len == 0 || 5 + r_len >= bytes.len() {
            return Err(malformed("bogus R"));
        }
        let s_pos = 4 + r_len;
        let s_len = bytes[s_pos + 1] as usize;
        if bytes[s_pos] != 0x02 || s_len == 0 || s_pos + 2 + s_len != bytes.len() {
            return Err(malformed("bogus S"));
        }

        let r = parse_der_int(&bytes[4..s_pos]).map_err(malformed)?;
        let s = parse_der_int(&bytes[s_pos + 2..]).map_err(malformed)?;
        Self::new(r, s)
    }

    /// Serialize in DER, normalizing S to the lower half of the order.
    pub fn to_der(&self) -> Vec<u8> {
        let sig = self.inner.normalize_s().unwrap_or_else(|| self.inner.clone());
        let (r, s) = sig.split_bytes();
        let rb = canonicalize_int(&r);
        let sb = canonicalize_int(&s);

        let mut out = Vec::with_capacity(6 + rb.len() + sb.len());
        out.push(0x30);
        out.push((4 + rb.len() + sb.len()) as u8);
        out.push(0x02);
        out.push(rb.len() as u8);
        out.extend_from_slice(&rb);
        out.push(0x02);
        out.push(sb.len() as u8);
        out.extend_from_slice(&sb);
        out
    }

    /// Sign a 32-byte message hash with an RFC6979 nonce.
    ///
    /// # Returns
    /// A low-S signature, or `InvalidSignature` if `hash` is not 32 bytes.
    pub fn sign(hash: &[u8], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        if hash.len() != 32 {
            return Err(PrimitivesError::InvalidSignature(format!(
                "message hash must be 32 bytes, got {}",
                hash.len()
            )));
        }
        let sig: ecdsa::Signature = priv_key
            .signing_key()
            .sign_prehash(hash)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        let inner = sig.normalize_s().unwrap_or(sig);
        Ok(Signature { inner })
    }

    /// Verify this signature against a 32-byte message hash.
    ///
    /// High-S signatures are accepted.
    pub fn verify(&self, hash: &[u8], pub_key: &PublicKey) -> bool {
        if hash.len() != 32 {
            return false;
        }
        let sig = self.inner.normalize_s().unwrap_or_else(|| self.inner.clone());
        pub_key.verifying_key().verify_prehash(hash, &sig).is_ok()
    }
}

fn malformed(msg: &str) -> PrimitivesError {
    PrimitivesError::InvalidSignature(format!("malformed signature: {}", msg))
}

/// Decode one DER INTEGER body into a 32-byte big-endian value.
fn parse_der_int(body: &[u8]) -> Result<[u8; 32], &'static str> {
    if body[0] & 0x80 != 0 {
        return Err("negative integer");
    }
    if body.len() > 1 && body[0] == 0 && body[1] & 0x80 == 0 {
        return Err("integer not minimally encoded");
    }
    let trimmed = if body[0] == 0 && body.len() > 1 { &body[1..] } else { body };
    if trimmed.len() > 32 {
        return Err("integer too large");
    }
    let mut out = [0u8; 32];
    out[32 - trimmed.len()..].copy_from_slice(trimmed);
    Ok(out)
}

/// Minimal DER INTEGER body for a 32-byte big-endian value.
fn canonicalize_int(val: &[u8]) -> Vec<u8> {
    let start = val.iter().position(|&b| b != 0).unwrap_or(val.len() - 1);
    let trimmed = &val[start..];
    let mut out = Vec::with_capacity(trimmed.len() + 1);
    if trimmed[0] & 0x80 != 0 {
        out.push(0x00);
    }
    out.extend_from_slice(trimmed);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;

    /// secp256k1 group order.
    const CURVE_ORDER: [u8; 32] = [
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
        0x41, 0x41,
    ];

    const VALID_DER: &str = "304402204e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd41\
                             0220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d09";

    fn negate(s: [u8; 32]) -> [u8; 32] {
        let mut out = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut diff = CURVE_ORDER[i] as i16 - s[i] as i16 - borrow;
            borrow = if diff < 0 { 1 } else { 0 };
            if diff < 0 {
                diff += 256;
            }
            out[i] = diff as u8;
        }
        out
    }

    #[test]
    fn test_der_parsing() {
        let valid = hex::decode(VALID_DER).unwrap();
        let sig = Signature::from_der(&valid).unwrap();
        assert_eq!(sig.to_der(), valid);
        assert!(sig.is_low_s());

        assert!(Signature::from_der(&[]).is_err());

        let mut bad_magic = valid.clone();
        bad_magic[0] = 0x31;
        assert!(Signature::from_der(&bad_magic).is_err());

        let mut bad_marker = valid.clone();
        bad_marker[2] = 0x03;
        assert!(Signature::from_der(&bad_marker).is_err());

        // trailing garbage
        let mut long = valid.clone();
        long.push(0x01);
        assert!(Signature::from_der(&long).is_err());

        // negative R
        let mut negative = valid.clone();
        negative[4] = 0x80;
        assert!(Signature::from_der(&negative).is_err());
    }

    #[test]
    fn test_der_rejects_padding() {
        // R padded with an unnecessary zero byte
        let padded = hex::decode(
            "30450221004e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd41\
             0220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d09",
        )
        .unwrap();
        assert!(Signature::from_der(&padded).is_err());
    }

    /// A high-S signature is serialized back in low-S form.
    #[test]
    fn test_to_der_normalizes_s() {
        let r = hex::decode("a196ed0e7ebcbe7b63fe1d8eecbdbde03a67ceba4fc8f6482bdcb9606a911404").unwrap();
        let s = hex::decode("971729c7fa944b465b35250c6570a2f31acbb14b13d1565fab7330dcb2b3dfb1").unwrap();
        let sig = Signature::new(r.try_into().unwrap(), s.try_into().unwrap()).unwrap();
        assert!(!sig.is_low_s());
        assert_eq!(
            hex::encode(sig.to_der()),
            "3045022100a196ed0e7ebcbe7b63fe1d8eecbdbde03a67ceba4fc8f6482bdcb9606a911404\
             022068e8d638056bb4b9a4cadaf39a8f5d0b9fe32b9b9b7749dc145f2db01d826190"
        );
    }

    #[test]
    fn test_new_rejects_zero() {
        assert!(Signature::new([0u8; 32], [1u8; 32]).is_err());
        assert!(Signature::new([1u8; 32], [0u8; 32]).is_err());
        assert!(Signature::new([1u8; 32], CURVE_ORDER).is_err());
    }

    /// RFC6979 vectors (Trezor / CoreBitcoin).
    #[test]
    fn test_rfc6979() {
        let tests = [
            (
                "cca9fbcc1b41e5a95d369eaa6ddcff73b61a4efaa279cfc6567e8daa39cbaf50",
                "sample",
                "3045022100af340daf02cc15c8d5d08d7735dfe6b98a474ed373bdb5fbecf7571be52b384202205009fb27f37034a9b24b707b7c6b79ca23ddef9e25f7282e8a797efe53a8f124",
            ),
            (
                "0000000000000000000000000000000000000000000000000000000000000001",
                "Satoshi Nakamoto",
                "3045022100934b1ea10a4b3c1757e2b0c017d0b6143ce3c9a7e6a4a49860d7a6ab210ee3d802202442ce9d2b916064108014783e923ec36b49743e2ffa1c4496f01a512aafd9e5",
            ),
            (
                "f8b8af8ce3c7cca5e300d33939540c10d45ce001b8f252bfbc57ba0342904181",
                "Alan Turing",
                "304402207063ae83e7f62bbb171798131b4a0564b956930092b33b07b395615d9ec7e15c022058dfcc1e00a35e1572f366ffe34ba0fc47db1e7189759b9fb233c5b05ab388ea",
            ),
        ];

        for (key_hex, msg, expected) in &tests {
            let priv_key = PrivateKey::from_hex(key_hex).unwrap();
            let hash = sha256(msg.as_bytes());
            let sig = priv_key.sign(&hash).unwrap();
            assert_eq!(hex::encode(sig.to_der()), *expected, "message '{}'", msg);
            assert!(priv_key.pub_key().verify(&hash, &sig));
        }
    }

    #[test]
    fn test_verify_accepts_high_s() {
        let priv_key = PrivateKey::from_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        let hash = sha256(b"Satoshi Nakamoto");
        let low = priv_key.sign(&hash).unwrap();
        let high = Signature::new(low.r(), negate(low.s())).unwrap();
        assert!(!high.is_low_s());
        assert!(priv_key.pub_key().verify(&hash, &high));
    }

    #[test]
    fn test_verify_rejects_wrong_hash_and_key() {
        let priv_key = PrivateKey::new();
        let hash = sha256(b"message");
        let sig = priv_key.sign(&hash).unwrap();
        assert!(!priv_key.pub_key().verify(&sha256(b"other"), &sig));
        assert!(!PrivateKey::new().pub_key().verify(&hash, &sig));
        assert!(!priv_key.pub_key().verify(&hash[..31], &sig));
        assert!(priv_key.sign(&hash[..31]).is_err());
    }
}
