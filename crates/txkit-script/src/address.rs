//! Bitcoin address handling.
//!
//! Encodes and decodes Base58Check P2PKH and P2SH addresses on every known
//! network. The version byte selects both the network and the address type.

use std::fmt;
use std::str::FromStr;

use txkit_primitives::base58::{check_decode_versioned, check_encode_versioned};
use txkit_primitives::{Network, PrimitivesError};

use crate::ScriptError;

/// Kind of hash an address commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// Hash160 of a public key.
    P2pkh,
    /// Hash160 of a redeem script.
    P2sh,
}

impl AddressType {
    fn version(self, network: Network) -> u8 {
        let params = network.params();
        match self {
            AddressType::P2pkh => params.p2pkh_prefix,
            AddressType::P2sh => params.p2sh_prefix,
        }
    }
}

/// A decoded address.
///
/// Contains the 20-byte hash, what it is a hash of, and the network it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    /// The 20-byte Hash160 the address commits to.
    pub hash: [u8; 20],
    /// Whether `hash` is a public key hash or a script hash.
    pub address_type: AddressType,
    /// The network this address belongs to.
    pub network: Network,
}

impl Address {
    /// Create an address from its parts.
    pub fn new(hash: [u8; 20], address_type: AddressType, network: Network) -> Self {
        Address {
            hash,
            address_type,
            network,
        }
    }

    /// Parse a Base58Check-encoded address string.
    ///
    /// # Arguments
    /// * `addr` - The Base58Check address string.
    ///
    /// # Returns
    /// An `Address`, or an error for bad characters, a bad checksum, a wrong
    /// payload length or an unknown version byte.
    pub fn from_string(addr: &str) -> Result<Self, ScriptError> {
        let (version, payload) = check_decode_versioned(addr.trim()).map_err(|e| match e {
            PrimitivesError::ChecksumMismatch => ScriptError::InvalidAddress(format!("checksum mismatch for '{}'", addr)),
            other => ScriptError::InvalidAddress(format!("{} for '{}'", other, addr)),
        })?;

        let hash: [u8; 20] = payload
            .as_slice()
            .try_into()
            .map_err(|_| ScriptError::InvalidAddress(format!("'{}' has a {}-byte payload", addr, payload.len())))?;

        let network = Network::from_address_prefix(version).ok_or(ScriptError::UnsupportedAddressVersion(version))?;
        let address_type = if version == network.params().p2pkh_prefix {
            AddressType::P2pkh
        } else {
            AddressType::P2sh
        };

        Ok(Address::new(hash, address_type, network))
    }

    /// Encode as a Base58Check string.
    pub fn to_address_string(&self) -> String {
        encode_address(&self.hash, self.address_type, self.network)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_address_string())
    }
}

impl FromStr for Address {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_string(s)
    }
}

/// Encode a 20-byte hash as an address of the given type on `network`.
pub fn encode_address(hash: &[u8; 20], address_type: AddressType, network: Network) -> String {
    check_encode_versioned(address_type.version(network), hash)
}

/// Decode an address string into its hash, type and network.
pub fn decode_address(addr: &str) -> Result<Address, ScriptError> {
    Address::from_string(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h20(s: &str) -> [u8; 20] {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_mainnet_p2pkh() {
        let addr = decode_address("12ooWd8Xag7hsgP9PBPnmyGe36VeUrpMSH").unwrap();
        assert_eq!(addr.hash, h20("13d215d212cd5188ae02c5635faabdc4d7d4ec91"));
        assert_eq!(addr.address_type, AddressType::P2pkh);
        assert_eq!(addr.network, Network::Bitcoin);
        assert_eq!(addr.to_string(), "12ooWd8Xag7hsgP9PBPnmyGe36VeUrpMSH");
    }

    #[test]
    fn test_testnet_p2pkh() {
        let hash = h20("f0d34949650af161e7cb3f0325a1a88330751650");
        let s = encode_address(&hash, AddressType::P2pkh, Network::Testnet);
        assert_eq!(s, "n3UKaXBRDhTVpkvgRH7eARZFsYE989bHjw");
        assert_eq!(decode_address(&s).unwrap().network, Network::Testnet);
    }

    #[test]
    fn test_testnet_p2sh() {
        let addr: Address = "2N5WPJ2qPzVpy5LeE576JCwZfWg1ikjUxdK".parse().unwrap();
        assert_eq!(addr.hash, h20("867f84607587f7c2054740c6cae09298ccbcd528"));
        assert_eq!(addr.address_type, AddressType::P2sh);
        assert_eq!(addr.network, Network::Testnet);
    }

    #[test]
    fn test_mainnet_p2sh_version() {
        let s = encode_address(&[0u8; 20], AddressType::P2sh, Network::Bitcoin);
        assert!(s.starts_with('3'));
        let addr = decode_address(&s).unwrap();
        assert_eq!(addr.address_type, AddressType::P2sh);
        assert_eq!(addr.network, Network::Bitcoin);
    }

    #[test]
    fn test_invalid_addresses() {
        // flipped last character breaks the checksum
        assert!(matches!(
            decode_address("16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvN"),
            Err(ScriptError::InvalidAddress(_))
        ));
        assert!(decode_address("0OIl").is_err());
        assert!(decode_address("").is_err());

        let unknown = check_encode_versioned(0x30, &[0u8; 20]);
        assert!(matches!(
            decode_address(&unknown),
            Err(ScriptError::UnsupportedAddressVersion(0x30))
        ));

        let short = check_encode_versioned(0x00, &[0u8; 19]);
        assert!(matches!(decode_address(&short), Err(ScriptError::InvalidAddress(_))));
    }
}
