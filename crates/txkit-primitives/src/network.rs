//! Network selection and the version bytes each network uses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PrimitivesError;

/// A Bitcoin-style network.
///
/// The network only affects text encodings (addresses and WIF keys);
/// the wire format of transactions is the same on every network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// The main network.
    #[default]
    Bitcoin,
    /// The public test network.
    Testnet,
}

/// Version bytes and naming for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// Canonical lowercase name.
    pub name: &'static str,
    /// Version byte of pay-to-public-key-hash addresses.
    pub p2pkh_prefix: u8,
    /// Version byte of pay-to-script-hash addresses.
    pub p2sh_prefix: u8,
    /// Version byte of WIF-encoded private keys.
    pub wif_prefix: u8,
}

const BITCOIN: NetworkParams = NetworkParams {
    name: "bitcoin",
    p2pkh_prefix: 0x00,
    p2sh_prefix: 0x05,
    wif_prefix: 0x80,
};

const TESTNET: NetworkParams = NetworkParams {
    name: "testnet",
    p2pkh_prefix: 0x6f,
    p2sh_prefix: 0xc4,
    wif_prefix: 0xef,
};

impl Network {
    /// All known networks, main network first.
    pub const ALL: [Network; 2] = [Network::Bitcoin, Network::Testnet];

    /// Return the parameters of this network.
    pub fn params(&self) -> &'static NetworkParams {
        match self {
            Network::Bitcoin => &BITCOIN,
            Network::Testnet => &TESTNET,
        }
    }

    /// Return the canonical name of this network.
    pub fn name(&self) -> &'static str {
        self.params().name
    }

    /// Find the network whose P2PKH or P2SH version byte is `prefix`.
    pub fn from_address_prefix(prefix: u8) -> Option<Network> {
        Network::ALL.into_iter().find(|n| {
            let p = n.params();
            p.p2pkh_prefix == prefix || p.p2sh_prefix == prefix
        })
    }

    /// Find the network whose WIF version byte is `prefix`.
    pub fn from_wif_prefix(prefix: u8) -> Option<Network> {
        Network::ALL
            .into_iter()
            .find(|n| n.params().wif_prefix == prefix)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bitcoin" | "mainnet" | "main" => Ok(Network::Bitcoin),
            "testnet" | "testnet3" | "test" => Ok(Network::Testnet),
            other => Err(PrimitivesError::UnknownNetwork(other.to_string())),
        }
    }
}
