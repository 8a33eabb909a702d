//! Transaction output with an amount and locking script.
//!
//! The script type and address are derived once, when the output is
//! created, and never change since the locking script is immutable.

use log::warn;
use serde_json::{json, Value};
use txkit_primitives::ec::PublicKey;
use txkit_primitives::util::{to_bytes, ByteReader, ByteSource, ByteWriter, VarInt};
use txkit_primitives::Network;
use txkit_script::{decode_address, nulldata_script, p2pkh_lock, p2sh_lock, parse_script, AddressType, Script, ScriptType};

use crate::TransactionError;

/// A single output in a transaction.
///
/// # Wire format
///
/// | Field            | Size           |
/// |------------------|----------------|
/// | amount           | 8 bytes (LE)   |
/// | script length    | VarInt         |
/// | lock_script      | variable       |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    amount: u64,
    lock_script: Script,
    script_type: ScriptType,
    address: Option<String>,
    network: Network,
}

impl Output {
    /// Create an output paying `amount` to a Base58Check address.
    ///
    /// # Arguments
    /// * `amount` - Value in the smallest unit.
    /// * `address` - A P2PKH or P2SH address.
    /// * `network` - The network the address must belong to.
    ///
    /// # Returns
    /// The output, or an error for an undecodable address or one from
    /// another network.
    pub fn new(amount: u64, address: &str, network: Network) -> Result<Self, TransactionError> {
        let decoded = decode_address(address)?;
        if decoded.network != network {
            return Err(TransactionError::InvalidOutput(format!(
                "address {} belongs to {}, not {}",
                address, decoded.network, network
            )));
        }
        let lock_script = match decoded.address_type {
            AddressType::P2pkh => p2pkh_lock(&decoded.hash),
            AddressType::P2sh => p2sh_lock(&decoded.hash),
        };
        Ok(Self::from_lock_script(amount, lock_script, network))
    }

    /// Create a P2PKH output for a public key, hashed in the encoding it carries.
    pub fn from_public_key(amount: u64, public_key: &PublicKey, network: Network) -> Self {
        Self::from_lock_script(amount, p2pkh_lock(&public_key.hash160()), network)
    }

    /// Create a P2PKH output from a 20-byte public key hash given as hex or bytes.
    pub fn from_public_key_hash<'a>(
        amount: u64,
        hash: impl Into<ByteSource<'a>>,
        network: Network,
    ) -> Result<Self, TransactionError> {
        let bytes = to_bytes(hash)?;
        let hash: [u8; 20] = bytes.as_slice().try_into().map_err(|_| {
            TransactionError::InvalidOutput(format!("public key hash must be 20 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_lock_script(amount, p2pkh_lock(&hash), network))
    }

    /// Create an output from an arbitrary locking script.
    ///
    /// A script that fails classification is kept as-is with type `unknown`.
    pub fn from_lock_script(amount: u64, lock_script: Script, network: Network) -> Self {
        let (script_type, address) = match parse_script(lock_script.to_bytes()) {
            Ok(parsed) => (parsed.script_type(), parsed.address(network)),
            Err(e) => {
                warn!("output script {} could not be classified: {}", lock_script, e);
                (ScriptType::Unknown, None)
            }
        };
        Output {
            amount,
            lock_script,
            script_type,
            address,
            network,
        }
    }

    /// Create a zero-value `OP_RETURN <data>` output.
    pub fn nulldata(data: &[u8], network: Network) -> Result<Self, TransactionError> {
        Ok(Self::from_lock_script(0, nulldata_script(data)?, network))
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn lock_script(&self) -> &Script {
        &self.lock_script
    }

    pub fn script_type(&self) -> ScriptType {
        self.script_type
    }

    /// The address this output pays to, if its script has one.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    // -----------------------------------------------------------------
    // Wire format
    // -----------------------------------------------------------------

    /// Deserialize an output from a `ByteReader`.
    ///
    /// # Returns
    /// The output with its script classified, or `Decode` if truncated.
    pub fn read_from(reader: &mut ByteReader, network: Network) -> Result<Self, TransactionError> {
        let amount = reader
            .read_u64_le()
            .map_err(|e| TransactionError::Decode(format!("reading amount: {}", e)))?;
        let script = reader
            .read_varstring()
            .map_err(|e| TransactionError::Decode(format!("reading locking script: {}", e)))?;
        Ok(Self::from_lock_script(amount, Script::from_bytes(script), network))
    }

    /// Serialize this output into a `ByteWriter`.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u64_le(self.amount);
        let script_bytes = self.lock_script.to_bytes();
        writer.write_varint(VarInt::from(script_bytes.len()));
        writer.write_bytes(script_bytes);
    }

    /// Serialize this output to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Project the output as `{amount, lock_script, address, script_type}`.
    pub fn to_json(&self) -> Value {
        json!({
            "amount": self.amount,
            "lock_script": self.lock_script.to_hex(),
            "address": self.address.as_deref().unwrap_or(""),
            "script_type": self.script_type.as_str(),
        })
    }
}
