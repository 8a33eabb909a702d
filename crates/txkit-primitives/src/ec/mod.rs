/// Elliptic curve cryptography on secp256k1.
///
/// Provides private keys (with WIF encoding), public keys that remember
/// their SEC1 encoding, and DER-encoded ECDSA signatures.

pub mod private_key;
pub mod public_key;
pub mod signature;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::Signature;
