/// txkit - Cryptographic primitives, hashing, and byte codec.
///
/// This crate provides the foundational building blocks for txkit:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - Chain hash type for transaction identification (display-order hex)
/// - Variable-length integer and byte string encoding
/// - Hex/bytes input normalization
/// - Base58Check encoding/decoding
/// - secp256k1 keys and DER-encoded ECDSA signatures
/// - Network parameters (address and WIF version bytes)

pub mod hash;
pub mod chainhash;
pub mod util;
pub mod base58;
pub mod ec;
pub mod network;

mod error;
pub use error::PrimitivesError;
pub use network::{Network, NetworkParams};
