//! Core transaction type.
//!
//! Represents a complete transaction with version, inputs, outputs, locktime
//! and the network its addresses belong to. Drives raw serialization, per
//! input signing and signature verification.

use std::fmt;

use log::{debug, warn};
use serde_json::{json, Value};
use txkit_primitives::chainhash::{double_hash_h, Hash};
use txkit_primitives::ec::{PrivateKey, PublicKey, Signature};
use txkit_primitives::util::{to_bytes, ByteReader, ByteSource, ByteWriter, VarInt};
use txkit_primitives::Network;
use txkit_script::{p2pkh_lock, ParsedScript, Script, ScriptType};

use crate::input::{Input, InputOptions};
use crate::output::Output;
use crate::sighash::{self, SIGHASH_ALL};
use crate::TransactionError;

/// A transaction consisting of a version, a set of inputs, a set of
/// outputs, and a lock time.
///
/// # Wire format
///
/// | Field        | Size                      |
/// |--------------|---------------------------|
/// | version      | 4 bytes (LE)              |
/// | input count  | VarInt                    |
/// | inputs       | variable (per input)      |
/// | output count | VarInt                    |
/// | outputs      | variable (per output)     |
/// | locktime     | 4 bytes (LE)              |
#[derive(Clone, Debug)]
pub struct Transaction {
    /// Transaction format version.
    pub version: u32,

    /// Ordered list of transaction inputs.
    pub inputs: Vec<Input>,

    /// Ordered list of transaction outputs.
    pub outputs: Vec<Output>,

    /// Lock time. If non-zero, the transaction is not valid until the
    /// specified block height or Unix timestamp.
    pub locktime: u32,

    /// Network used to derive and check addresses.
    pub network: Network,
}

impl Transaction {
    /// Create a new empty transaction with version 1 and lock time 0.
    pub fn new(network: Network) -> Self {
        Transaction {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            locktime: 0,
            network,
        }
    }

    /// Create a version 1 transaction from existing inputs and outputs.
    pub fn with_parts(inputs: Vec<Input>, outputs: Vec<Output>, network: Network) -> Self {
        Transaction {
            inputs,
            outputs,
            ..Self::new(network)
        }
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a raw transaction given as hex or bytes.
    ///
    /// Every input and output is classified while parsing, so script types
    /// and addresses are available straight away.
    ///
    /// # Arguments
    /// * `raw` - The serialized transaction, as a hex string or raw bytes.
    /// * `network` - The network its addresses belong to.
    ///
    /// # Returns
    /// The transaction, or `Decode` if the data is not hex, is truncated,
    /// or has trailing bytes.
    pub fn import_raw<'a>(raw: impl Into<ByteSource<'a>>, network: Network) -> Result<Self, TransactionError> {
        let bytes = to_bytes(raw).map_err(|e| TransactionError::Decode(e.to_string()))?;
        let mut reader = ByteReader::new(&bytes);
        let tx = Self::read_from(&mut reader, network)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::Decode(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Deserialize a transaction from a `ByteReader`.
    pub fn read_from(reader: &mut ByteReader, network: Network) -> Result<Self, TransactionError> {
        let version = reader
            .read_u32_le()
            .map_err(|e| TransactionError::Decode(format!("reading version: {}", e)))?;

        let input_count = reader
            .read_varint()
            .map_err(|e| TransactionError::Decode(format!("reading input count: {}", e)))?
            .value();
        // every input takes at least 41 bytes
        let mut inputs = Vec::with_capacity((input_count as usize).min(reader.remaining() / 41));
        for tid in 0..input_count as usize {
            inputs.push(Input::read_from(reader, tid, network)?);
        }

        let output_count = reader
            .read_varint()
            .map_err(|e| TransactionError::Decode(format!("reading output count: {}", e)))?
            .value();
        let mut outputs = Vec::with_capacity((output_count as usize).min(reader.remaining() / 9));
        for _ in 0..output_count {
            outputs.push(Output::read_from(reader, network)?);
        }

        let locktime = reader
            .read_u32_le()
            .map_err(|e| TransactionError::Decode(format!("reading locktime: {}", e)))?;

        Ok(Transaction {
            version,
            inputs,
            outputs,
            locktime,
            network,
        })
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Serialize this transaction to raw wire-format bytes.
    pub fn raw(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(256);
        writer.write_u32_le(self.version);

        writer.write_varint(VarInt::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(&mut writer);
        }

        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(&mut writer);
        }

        writer.write_u32_le(self.locktime);
        writer.into_bytes()
    }

    /// Serialize this transaction to a lowercase hex string.
    pub fn raw_hex(&self) -> String {
        hex::encode(self.raw())
    }

    /// The transaction id: double SHA-256 of the raw bytes.
    ///
    /// Displays in the conventional reversed byte order.
    pub fn txid(&self) -> Hash {
        double_hash_h(&self.raw())
    }

    // -----------------------------------------------------------------
    // Inputs and outputs
    // -----------------------------------------------------------------

    /// Add an input spending output `output_index` of `prev_hash`.
    ///
    /// The input's `tid` defaults to its position in the transaction.
    ///
    /// # Returns
    /// The index of the new input.
    pub fn add_input<'a>(
        &mut self,
        prev_hash: impl Into<ByteSource<'a>>,
        output_index: u32,
        mut options: InputOptions,
    ) -> Result<usize, TransactionError> {
        options.tid.get_or_insert(self.inputs.len());
        let input = Input::new(prev_hash, output_index, options, self.network)?;
        Ok(self.push_input(input))
    }

    /// Append an already built input and return its index.
    pub fn push_input(&mut self, input: Input) -> usize {
        self.inputs.push(input);
        self.inputs.len() - 1
    }

    /// Add an output paying `amount` to `address`, which must belong to
    /// this transaction's network.
    ///
    /// # Returns
    /// The index of the new output.
    pub fn add_output(&mut self, amount: u64, address: &str) -> Result<usize, TransactionError> {
        let output = Output::new(amount, address, self.network)?;
        Ok(self.push_output(output))
    }

    /// Append an already built output and return its index.
    pub fn push_output(&mut self, output: Output) -> usize {
        self.outputs.push(output);
        self.outputs.len() - 1
    }

    // -----------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------

    /// Compute the signature hash of an input against its own subscript.
    ///
    /// # Arguments
    /// * `input_index` - Index of the input being signed.
    /// * `sighash_type` - The sighash flags, e.g. `SIGHASH_ALL`.
    pub fn signature_hash(&self, input_index: usize, sighash_type: u32) -> Result<[u8; 32], TransactionError> {
        let subscript = self.input(input_index)?.subscript()?;
        sighash::signature_hash(self, input_index, subscript.to_bytes(), sighash_type)
    }

    /// Sign inputs with `SIGHASH_ALL`.
    ///
    /// See [`Transaction::sign_with`].
    pub fn sign(&mut self, keys: &[PrivateKey], input_index: Option<usize>) -> Result<usize, TransactionError> {
        self.sign_with(keys, input_index, SIGHASH_ALL)
    }

    /// Sign one input, or every signable input, with each key that belongs to it.
    ///
    /// Keys that are not part of an input, keys that already signed it and
    /// keys beyond the required count are skipped, so signing twice with the
    /// same key adds nothing the second time.
    ///
    /// # Arguments
    /// * `keys` - The private keys to sign with.
    /// * `input_index` - The input to sign, or `None` for all of them.
    /// * `sighash_type` - The sighash flags committed to by each signature.
    ///
    /// # Returns
    /// The number of signatures added. Asking for a specific input that
    /// cannot be signed (coinbase, unknown type, no key) is an error; with
    /// `None` such inputs are skipped.
    pub fn sign_with(
        &mut self,
        keys: &[PrivateKey],
        input_index: Option<usize>,
        sighash_type: u32,
    ) -> Result<usize, TransactionError> {
        let targets = match input_index {
            Some(index) => {
                self.input(index)?;
                index..index + 1
            }
            None => 0..self.inputs.len(),
        };

        let mut added = 0;
        for index in targets {
            match self.sign_input(index, keys, sighash_type) {
                Ok(n) => added += n,
                Err(TransactionError::SigningError(reason)) if input_index.is_none() => {
                    debug!("skipping input {}: {}", index, reason);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }

    fn sign_input(&mut self, index: usize, keys: &[PrivateKey], sighash_type: u32) -> Result<usize, TransactionError> {
        let subscript = self.inputs[index].subscript()?;
        self.match_imported_signatures(index, &subscript)?;

        let mut added = 0;
        for key in keys {
            let public_key = key.pub_key();
            let key_index = match self.inputs[index].key_index(&public_key) {
                Some(key_index) => key_index,
                None => {
                    debug!("input {}: key {} is not one of its keys", index, public_key.to_hex());
                    continue;
                }
            };
            if self.inputs[index].is_key_signed(key_index) {
                debug!("input {}: key {} already signed", index, public_key.to_hex());
                continue;
            }

            let digest = sighash::signature_hash(self, index, subscript.to_bytes(), sighash_type)?;
            let mut signature = key.sign(&digest)?.to_der();
            signature.push(sighash_type as u8);
            if self.inputs[index].add_signature(key_index, signature)? {
                debug!("input {}: added signature of key {}", index, key_index);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Assign signatures read from a raw transaction to the keys that made them.
    ///
    /// Signatures that no longer verify are dropped and the unlocking script
    /// is rewritten without them.
    fn match_imported_signatures(&mut self, index: usize, subscript: &Script) -> Result<(), TransactionError> {
        let mut dropped = 0;
        for signature in self.inputs[index].take_unmatched() {
            let input = &self.inputs[index];
            let key_index = (0..input.keys().len()).find(|&k| {
                !input.is_key_signed(k) && self.check_signature(index, subscript.to_bytes(), &signature, &input.keys()[k])
            });
            let result = match key_index {
                Some(k) => self.inputs[index].add_signature(k, signature),
                None => Ok(false),
            };
            if !matches!(result, Ok(true)) {
                warn!("input {}: dropping an imported signature that matches none of its keys", index);
                dropped += 1;
            }
        }
        if dropped > 0 {
            self.inputs[index].rebuild_unlocking_script()?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------

    /// Check every input's signatures.
    ///
    /// Coinbase inputs pass. P2PKH inputs need one valid signature by the key
    /// in their unlocking script; P2SH multisig inputs need at least m valid
    /// signatures, matched to distinct keys in redeem-script order. Every
    /// other input type fails.
    pub fn verify(&self) -> bool {
        (0..self.inputs.len()).all(|index| self.verify_input(index))
    }

    fn verify_input(&self, index: usize) -> bool {
        let input = &self.inputs[index];
        if input.is_coinbase() {
            return true;
        }
        let parsed = match input.unlocking_script().parse() {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        match (input.script_type(), parsed) {
            (ScriptType::P2pkh, ParsedScript::SigPubkey { signatures, keys })
                if signatures.len() == 1 && keys.len() == 1 =>
            {
                let key = match PublicKey::from_bytes(&keys[0]) {
                    Ok(key) => key,
                    Err(_) => return false,
                };
                let subscript = p2pkh_lock(&key.hash160());
                self.check_signature(index, subscript.to_bytes(), &signatures[0], &key)
            }
            (
                ScriptType::P2shMultisig,
                ParsedScript::P2shMultisig {
                    signatures,
                    m,
                    keys,
                    redeem_script,
                    ..
                },
            ) => {
                let keys = match keys.iter().map(|k| PublicKey::from_bytes(k)).collect::<Result<Vec<_>, _>>() {
                    Ok(keys) => keys,
                    Err(_) => return false,
                };
                let mut remaining = keys.iter();
                let valid = signatures
                    .iter()
                    .filter(|signature| {
                        remaining
                            .by_ref()
                            .any(|key| self.check_signature(index, &redeem_script, signature.as_slice(), key))
                    })
                    .count();
                valid >= m
            }
            _ => false,
        }
    }

    /// Verify a script signature (DER plus hashtype byte) against `key`.
    fn check_signature(&self, index: usize, subscript: &[u8], signature: &[u8], key: &PublicKey) -> bool {
        let (&hashtype, der) = match signature.split_last() {
            Some(parts) => parts,
            None => return false,
        };
        let signature = match Signature::from_der(der) {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        match sighash::signature_hash(self, index, subscript, u32::from(hashtype)) {
            Ok(digest) => key.verify(&digest, &signature),
            Err(_) => false,
        }
    }

    // -----------------------------------------------------------------
    // Projection
    // -----------------------------------------------------------------

    /// Project the transaction as a JSON object.
    pub fn to_json(&self) -> Value {
        json!({
            "txid": self.txid().to_string(),
            "version": self.version,
            "locktime": self.locktime,
            "network": self.network.name(),
            "inputs": self.inputs.iter().map(Input::to_json).collect::<Vec<_>>(),
            "outputs": self.outputs.iter().map(Output::to_json).collect::<Vec<_>>(),
        })
    }

    fn input(&self, index: usize) -> Result<&Input, TransactionError> {
        self.inputs.get(index).ok_or(TransactionError::InputIndex {
            index,
            count: self.inputs.len(),
        })
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new(Network::default())
    }
}

impl fmt::Display for Transaction {
    /// Display the transaction as its hex-encoded serialization.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_hex())
    }
}
