//! Transaction input spending a previous output.
//!
//! An input knows the keys that may sign it and collects their signatures
//! keyed by key position, so the unlocking script it rebuilds is the same
//! whatever order the signers arrive in. Inputs read from raw bytes derive
//! their keys, redeem script and address from the unlocking script; the
//! signatures found there stay unassigned until the next signing pass
//! checks them against those keys.

use log::{debug, warn};
use serde::Serialize;
use serde_json::{json, Map, Value};
use txkit_primitives::chainhash::Hash;
use txkit_primitives::ec::PublicKey;
use txkit_primitives::hash::hash160;
use txkit_primitives::util::{to_bytes, ByteReader, ByteSource, ByteWriter};
use txkit_primitives::Network;
use txkit_script::{
    build_multisig_redeemscript, encode_address, p2pkh_lock, parse_script, AddressType, ParsedScript, Script,
    ScriptType,
};

use crate::TransactionError;

/// Default sequence number indicating a finalized input (no relative lock-time).
pub const DEFAULT_SEQUENCE: u32 = 0xFFFF_FFFF;

/// Output index of the null outpoint spent by coinbase inputs.
pub const COINBASE_OUTPUT_INDEX: u32 = 0xFFFF_FFFF;

/// Signing progress of an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputStatus {
    /// No signatures yet.
    Unsigned,
    /// Some, but fewer than the required number of signatures.
    PartiallySigned,
    /// The required number of signatures is present.
    FullySigned,
}

/// A signature together with the position of the key that made it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySignature {
    /// Index into the input's key list.
    pub key_index: usize,
    /// DER signature followed by its sighash-type byte.
    pub signature: Vec<u8>,
}

/// Optional settings for [`Input::new`].
///
/// With no script type given, one key means P2PKH and several keys mean
/// P2SH multisig requiring every key unless `sigs_required` says otherwise.
#[derive(Clone, Debug)]
pub struct InputOptions {
    pub keys: Vec<PublicKey>,
    pub script_type: Option<ScriptType>,
    pub sigs_required: Option<usize>,
    /// Order multisig keys by their encoded bytes before building the redeem script.
    pub sort: bool,
    pub sequence: u32,
    pub unlocking_script: Option<Script>,
    /// Identifier echoed in the JSON projection; defaults to the input's position.
    pub tid: Option<usize>,
}

impl Default for InputOptions {
    fn default() -> Self {
        InputOptions {
            keys: Vec::new(),
            script_type: None,
            sigs_required: None,
            sort: false,
            sequence: DEFAULT_SEQUENCE,
            unlocking_script: None,
            tid: None,
        }
    }
}

impl InputOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: PublicKey) -> Self {
        self.keys.push(key);
        self
    }

    pub fn keys(mut self, keys: impl IntoIterator<Item = PublicKey>) -> Self {
        self.keys.extend(keys);
        self
    }

    pub fn script_type(mut self, script_type: ScriptType) -> Self {
        self.script_type = Some(script_type);
        self
    }

    pub fn sigs_required(mut self, m: usize) -> Self {
        self.sigs_required = Some(m);
        self
    }

    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn unlocking_script(mut self, script: Script) -> Self {
        self.unlocking_script = Some(script);
        self
    }

    pub fn tid(mut self, tid: usize) -> Self {
        self.tid = Some(tid);
        self
    }
}

/// A single input in a transaction.
///
/// # Wire format
///
/// | Field            | Size             |
/// |------------------|------------------|
/// | prev_hash        | 32 bytes (wire order) |
/// | output_index     | 4 bytes (LE)     |
/// | script length    | VarInt           |
/// | unlocking_script | variable         |
/// | sequence         | 4 bytes (LE)     |
#[derive(Clone, Debug)]
pub struct Input {
    prev_hash: Hash,
    output_index: u32,
    unlocking_script: Script,
    sequence: u32,
    script_type: ScriptType,
    sigs_required: usize,
    keys: Vec<PublicKey>,
    /// Sorted by `key_index`.
    signatures: Vec<KeySignature>,
    /// Signatures read from an unlocking script whose keys are not known yet.
    unmatched: Vec<Vec<u8>>,
    redeem_script: Option<Script>,
    address: Option<String>,
    network: Network,
    tid: usize,
}

impl Input {
    /// Create an input spending output `output_index` of transaction `prev_hash`.
    ///
    /// # Arguments
    /// * `prev_hash` - The previous transaction id in display order, as hex or bytes.
    /// * `output_index` - Index of the output being spent.
    /// * `options` - Keys, script type and other settings.
    /// * `network` - Network used for the derived address.
    ///
    /// # Returns
    /// The input, or an error for a hash that is not 32 bytes, a script
    /// type that cannot be spent, or invalid multisig parameters.
    pub fn new<'a>(
        prev_hash: impl Into<ByteSource<'a>>,
        output_index: u32,
        options: InputOptions,
        network: Network,
    ) -> Result<Self, TransactionError> {
        let bytes = to_bytes(prev_hash)?;
        let prev_hash = Hash::from_display_bytes(&bytes).map_err(|_| {
            TransactionError::InvalidInput(format!("previous hash must be 32 bytes, got {}", bytes.len()))
        })?;
        Self::from_outpoint(prev_hash, output_index, options, network)
    }

    /// Create an input from a previous hash already in wire order.
    pub fn from_outpoint(
        prev_hash: Hash,
        output_index: u32,
        options: InputOptions,
        network: Network,
    ) -> Result<Self, TransactionError> {
        let InputOptions {
            keys,
            script_type,
            sigs_required,
            sort,
            sequence,
            unlocking_script,
            tid,
        } = options;

        let mut input = Input {
            prev_hash,
            output_index,
            unlocking_script: unlocking_script.unwrap_or_default(),
            sequence,
            script_type: ScriptType::P2pkh,
            sigs_required: 1,
            keys,
            signatures: Vec::new(),
            unmatched: Vec::new(),
            redeem_script: None,
            address: None,
            network,
            tid: tid.unwrap_or(0),
        };

        if prev_hash.is_zero() && output_index == COINBASE_OUTPUT_INDEX {
            input.script_type = ScriptType::Coinbase;
            input.sigs_required = 0;
            return Ok(input);
        }

        if input.unlocking_script.is_empty() {
            input.configure(script_type, sigs_required, sort)?;
        } else {
            input.adopt_unlocking_script();
        }
        Ok(input)
    }

    /// Derive script type, keys and redeem script from the options.
    fn configure(
        &mut self,
        script_type: Option<ScriptType>,
        sigs_required: Option<usize>,
        sort: bool,
    ) -> Result<(), TransactionError> {
        let script_type = script_type.unwrap_or(if self.keys.len() > 1 {
            ScriptType::P2shMultisig
        } else {
            ScriptType::P2pkh
        });

        match script_type {
            ScriptType::P2pkh => {
                if self.keys.len() > 1 {
                    return Err(TransactionError::InvalidInput(format!(
                        "a p2pkh input takes one key, got {}",
                        self.keys.len()
                    )));
                }
                self.sigs_required = 1;
                self.address = self
                    .keys
                    .first()
                    .map(|key| encode_address(&key.hash160(), AddressType::P2pkh, self.network));
            }
            ScriptType::P2shMultisig => {
                if sort {
                    self.keys.sort_by_key(PublicKey::to_bytes);
                }
                let m = sigs_required.unwrap_or(self.keys.len());
                let encoded: Vec<Vec<u8>> = self.keys.iter().map(PublicKey::to_bytes).collect();
                let redeem = build_multisig_redeemscript(&encoded, m, false)?;
                self.address = Some(encode_address(
                    &hash160(redeem.to_bytes()),
                    AddressType::P2sh,
                    self.network,
                ));
                self.sigs_required = m;
                self.redeem_script = Some(redeem);
            }
            other => {
                return Err(TransactionError::InvalidInput(format!("cannot spend a {} output", other)));
            }
        }
        self.script_type = script_type;
        Ok(())
    }

    /// Derive everything from a non-empty unlocking script.
    ///
    /// Scripts that cannot be classified leave the input as `unknown`.
    fn adopt_unlocking_script(&mut self) {
        let parsed = match parse_script(self.unlocking_script.to_bytes()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("unlocking script of input {} could not be classified: {}", self.tid, e);
                return self.mark_unknown();
            }
        };

        let keys: Result<Vec<PublicKey>, _> = parsed.keys().iter().map(|k| PublicKey::from_bytes(k)).collect();
        let keys = match keys {
            Ok(keys) => keys,
            Err(e) => {
                warn!("input {} carries an unusable public key: {}", self.tid, e);
                return self.mark_unknown();
            }
        };

        match parsed {
            ParsedScript::SigPubkey { signatures, .. } if signatures.len() == 1 && keys.len() == 1 => {
                self.address = Some(encode_address(&keys[0].hash160(), AddressType::P2pkh, self.network));
                self.unmatched = signatures;
                self.script_type = ScriptType::P2pkh;
                self.sigs_required = 1;
            }
            ParsedScript::P2shMultisig {
                signatures,
                m,
                redeem_script,
                ..
            } => {
                self.address = Some(encode_address(&hash160(&redeem_script), AddressType::P2sh, self.network));
                self.redeem_script = Some(Script::from(redeem_script));
                self.unmatched = signatures;
                self.script_type = ScriptType::P2shMultisig;
                self.sigs_required = m;
            }
            other => {
                warn!(
                    "input {} has an unlocking script of type {}, treating it as unknown",
                    self.tid,
                    other.script_type()
                );
                return self.mark_unknown();
            }
        }
        self.keys = keys;
    }

    fn mark_unknown(&mut self) {
        self.script_type = ScriptType::Unknown;
        self.sigs_required = 0;
        self.keys.clear();
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// The previous transaction id, stored in wire order.
    pub fn prev_hash(&self) -> &Hash {
        &self.prev_hash
    }

    pub fn output_index(&self) -> u32 {
        self.output_index
    }

    pub fn unlocking_script(&self) -> &Script {
        &self.unlocking_script
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn script_type(&self) -> ScriptType {
        self.script_type
    }

    /// Signatures needed to spend this input (m).
    pub fn sigs_required(&self) -> usize {
        self.sigs_required
    }

    /// Keys that may sign this input (n).
    pub fn sigs_total(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }

    /// Signatures matched to keys so far, in key order.
    pub fn signatures(&self) -> &[KeySignature] {
        &self.signatures
    }

    pub fn redeem_script(&self) -> Option<&Script> {
        self.redeem_script.as_ref()
    }

    /// The address of the output being spent, when it can be derived.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn tid(&self) -> usize {
        self.tid
    }

    pub fn is_coinbase(&self) -> bool {
        self.script_type == ScriptType::Coinbase
    }

    pub fn status(&self) -> InputStatus {
        if self.is_coinbase() {
            return InputStatus::FullySigned;
        }
        match self.signatures.len() + self.unmatched.len() {
            0 => InputStatus::Unsigned,
            n if n >= self.sigs_required => InputStatus::FullySigned,
            _ => InputStatus::PartiallySigned,
        }
    }

    // -----------------------------------------------------------------
    // Signing support
    // -----------------------------------------------------------------

    /// The script a signature for this input commits to: the P2PKH locking
    /// script of its key, or its redeem script.
    pub fn subscript(&self) -> Result<Script, TransactionError> {
        match self.script_type {
            ScriptType::P2pkh => self
                .keys
                .first()
                .map(|key| p2pkh_lock(&key.hash160()))
                .ok_or_else(|| TransactionError::SigningError(format!("input {} has no public key", self.tid))),
            ScriptType::P2shMultisig => self
                .redeem_script
                .clone()
                .ok_or_else(|| TransactionError::SigningError(format!("input {} has no redeem script", self.tid))),
            other => Err(TransactionError::SigningError(format!(
                "cannot sign input {} of type {}",
                self.tid, other
            ))),
        }
    }

    /// Position of `key` in this input's key list, in any encoding.
    pub fn key_index(&self, key: &PublicKey) -> Option<usize> {
        self.keys.iter().position(|k| k.same_point(key))
    }

    pub(crate) fn take_unmatched(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.unmatched)
    }

    pub(crate) fn is_key_signed(&self, key_index: usize) -> bool {
        self.signatures.iter().any(|s| s.key_index == key_index)
    }

    /// Record a signature for the key at `key_index` and rebuild the
    /// unlocking script.
    ///
    /// # Returns
    /// `false` without changes if that key already signed or the input
    /// already holds the required number of signatures.
    pub(crate) fn add_signature(&mut self, key_index: usize, signature: Vec<u8>) -> Result<bool, TransactionError> {
        if key_index >= self.keys.len() {
            return Ok(false);
        }
        if self.is_key_signed(key_index) {
            debug!("input {}: key {} already signed", self.tid, key_index);
            return Ok(false);
        }
        if self.signatures.len() >= self.sigs_required {
            debug!("input {}: already has {} signatures", self.tid, self.sigs_required);
            return Ok(false);
        }
        let pos = self.signatures.partition_point(|s| s.key_index < key_index);
        self.signatures.insert(pos, KeySignature { key_index, signature });
        self.rebuild_unlocking_script()?;
        Ok(true)
    }

    /// Rewrite the unlocking script from the signatures matched so far.
    pub(crate) fn rebuild_unlocking_script(&mut self) -> Result<(), TransactionError> {
        let signatures: Vec<Vec<u8>> = self.signatures.iter().map(|s| s.signature.clone()).collect();
        let keys: Vec<Vec<u8>> = self.keys.iter().map(PublicKey::to_bytes).collect();
        let parsed = match (self.script_type, &self.redeem_script) {
            _ if signatures.is_empty() => ParsedScript::Empty,
            (ScriptType::P2pkh, _) => ParsedScript::SigPubkey { signatures, keys },
            (ScriptType::P2shMultisig, Some(redeem)) => ParsedScript::P2shMultisig {
                signatures,
                m: self.sigs_required,
                n: keys.len(),
                keys,
                redeem_script: redeem.to_bytes().to_vec(),
            },
            _ => return Ok(()),
        };
        self.unlocking_script = parsed.to_script()?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Wire format
    // -----------------------------------------------------------------

    /// Deserialize an input from a `ByteReader`, classifying its unlocking script.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded input.
    /// * `tid` - Position of the input in its transaction.
    /// * `network` - Network used for the derived address.
    pub fn read_from(reader: &mut ByteReader, tid: usize, network: Network) -> Result<Self, TransactionError> {
        let prev_hash: [u8; 32] = reader
            .read_array()
            .map_err(|e| TransactionError::Decode(format!("reading previous hash: {}", e)))?;
        let output_index = reader
            .read_u32_le()
            .map_err(|e| TransactionError::Decode(format!("reading output index: {}", e)))?;
        let script = reader
            .read_varstring()
            .map_err(|e| TransactionError::Decode(format!("reading unlocking script: {}", e)))?;
        let sequence = reader
            .read_u32_le()
            .map_err(|e| TransactionError::Decode(format!("reading sequence: {}", e)))?;

        let options = InputOptions::new()
            .unlocking_script(Script::from_bytes(script))
            .sequence(sequence)
            .tid(tid);
        Self::from_outpoint(Hash::new(prev_hash), output_index, options, network)
    }

    /// Serialize this input into a `ByteWriter`.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_bytes(self.prev_hash.as_bytes());
        writer.write_u32_le(self.output_index);
        writer.write_varstring(self.unlocking_script.to_bytes());
        writer.write_u32_le(self.sequence);
    }

    /// Project the input as a JSON object.
    ///
    /// `keys` is only present for inputs with more than one key.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("prev_hash".into(), json!(self.prev_hash.to_string()));
        map.insert("output_index".into(), json!(format!("{:08x}", self.output_index)));
        map.insert("unlocking_script".into(), json!(self.unlocking_script.to_hex()));
        map.insert("address".into(), json!(self.address.as_deref().unwrap_or("")));
        map.insert(
            "redeemscript".into(),
            json!(self.redeem_script.as_ref().map(Script::to_hex).unwrap_or_default()),
        );
        map.insert("script_type".into(), json!(self.script_type.as_str()));
        map.insert("sequence".into(), json!(format!("{:08x}", self.sequence)));
        map.insert(
            "public_key".into(),
            json!(self.keys.first().map(PublicKey::to_hex).unwrap_or_default()),
        );
        if self.keys.len() > 1 {
            map.insert(
                "keys".into(),
                Value::Array(self.keys.iter().map(|k| json!(k.to_hex())).collect()),
            );
        }
        map.insert("tid".into(), json!(self.tid));
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txkit_primitives::ec::PrivateKey;

    const PREV: &str = "81b4c832d70cb56ff957589752eb4125a4cab78a25a8fc52d6a09e5bd4404d48";

    fn key(byte: u8) -> PrivateKey {
        PrivateKey::from_bytes(&[byte; 32]).unwrap()
    }

    #[test]
    fn test_prev_hash_from_hex_bytes_and_array() {
        let bytes = hex::decode(PREV).unwrap();
        let array: [u8; 32] = bytes.clone().try_into().unwrap();
        for input in [
            Input::new(PREV, 0, InputOptions::new(), Network::Bitcoin).unwrap(),
            Input::new(&bytes, 0, InputOptions::new(), Network::Bitcoin).unwrap(),
            Input::new(&array, 0, InputOptions::new(), Network::Bitcoin).unwrap(),
        ] {
            assert_eq!(input.prev_hash().to_string(), PREV);
            assert_eq!(input.prev_hash().to_display_bytes().to_vec(), bytes);
        }
        assert!(matches!(
            Input::new("81b4", 0, InputOptions::new(), Network::Bitcoin),
            Err(TransactionError::InvalidInput(_))
        ));
        assert!(Input::new("zz", 0, InputOptions::new(), Network::Bitcoin).is_err());
    }

    #[test]
    fn test_unlocking_script_json() {
        let prev = hex::decode("e33ebd17938bc013c62895892aac54df3f5bce96e44b8949949275741b1427e5").unwrap();
        let script = Script::from_hex(
            "47304402206ca28f7bafdd65bdfc0fbd88f5a5b003699127caf0fff6e65535d7f131152c0302201617\
             303f638e08947f18697edcb3a7a53ae66df94f2629db98dc0cc5076b34b7012102309a196919cff1d1\
             8754271be7ee54d1b37f414cbb292b55d7ed1f0dc8209d13",
        )
        .unwrap();
        let input = Input::new(&prev, 0, InputOptions::new().unlocking_script(script), Network::Bitcoin).unwrap();
        let expected = json!({
            "public_key": "02309a196919cff1d18754271be7ee54d1b37f414cbb292b55d7ed1f0dc8209d13",
            "output_index": "00000000",
            "unlocking_script": "47304402206ca28f7bafdd65bdfc0fbd88f5a5b003699127caf0fff6e65535d7f131152c0302201617\
                                 303f638e08947f18697edcb3a7a53ae66df94f2629db98dc0cc5076b34b7012102309a196919cff1d1\
                                 8754271be7ee54d1b37f414cbb292b55d7ed1f0dc8209d13",
            "sequence": "ffffffff",
            "prev_hash": "e33ebd17938bc013c62895892aac54df3f5bce96e44b8949949275741b1427e5",
            "tid": 0,
            "address": "1L1Gohs21Xg54MvHuBMbmxhZSNCa1d3Cc2",
            "redeemscript": "",
            "script_type": "p2pkh",
        });
        assert_eq!(input.to_json(), expected);
        assert_eq!(input.status(), InputStatus::FullySigned);
        assert_eq!(serde_json::to_value(input.status()).unwrap(), json!("fully_signed"));
    }

    #[test]
    fn test_coinbase_needs_null_outpoint() {
        let input = Input::new(&[0u8; 32], COINBASE_OUTPUT_INDEX, InputOptions::new(), Network::Bitcoin).unwrap();
        assert_eq!(input.script_type(), ScriptType::Coinbase);
        assert!(input.is_coinbase());
        assert!(input.subscript().is_err());

        // coinbase regardless of script contents
        let script = Script::from_hex("03a08601").unwrap();
        let options = InputOptions::new().unlocking_script(script);
        let input = Input::new(&[0u8; 32], COINBASE_OUTPUT_INDEX, options, Network::Bitcoin).unwrap();
        assert_eq!(input.script_type(), ScriptType::Coinbase);

        let input = Input::new(&[0u8; 32], 0, InputOptions::new(), Network::Bitcoin).unwrap();
        assert_eq!(input.script_type(), ScriptType::P2pkh);
    }

    #[test]
    fn test_public_key_address() {
        let pk = PrivateKey::from_hex("18e14a7b6a307f426a94f8114701e7c8e774e7f9a47e2c2035db29a206321725")
            .unwrap()
            .with_compression(false);
        let prev = "f2b3eb2deb76566e7324307cd47c35eeb88413f971d88519859b1834307ecfec";
        let input = Input::new(prev, 1, InputOptions::new().key(pk.pub_key()), Network::Bitcoin).unwrap();
        assert_eq!(input.address(), Some("16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM"));
        assert_eq!(input.script_type(), ScriptType::P2pkh);
        assert_eq!(input.status(), InputStatus::Unsigned);
        assert_eq!(
            input.subscript().unwrap().to_hex(),
            "76a914010966776006953d5567439e5e39f86a0d273bee88ac"
        );
    }

    #[test]
    fn test_multisig_defaults_and_sorting() {
        let keys: Vec<PublicKey> = (1..=3).map(|i| key(i).pub_key()).collect();
        let input = Input::new(PREV, 0, InputOptions::new().keys(keys.clone()), Network::Bitcoin).unwrap();
        assert_eq!(input.script_type(), ScriptType::P2shMultisig);
        assert_eq!(input.sigs_required(), 3);
        assert_eq!(input.sigs_total(), 3);
        assert!(input.address().unwrap().starts_with('3'));
        assert_eq!(input.to_json()["keys"].as_array().unwrap().len(), 3);

        let reversed: Vec<PublicKey> = keys.iter().rev().cloned().collect();
        let sorted = Input::new(
            PREV,
            0,
            InputOptions::new().keys(reversed.clone()).sigs_required(2).sort(true),
            Network::Bitcoin,
        )
        .unwrap();
        let unsorted = Input::new(
            PREV,
            0,
            InputOptions::new().keys(reversed).sigs_required(2),
            Network::Bitcoin,
        )
        .unwrap();
        let mut encoded: Vec<Vec<u8>> = keys.iter().map(PublicKey::to_bytes).collect();
        encoded.sort();
        assert_eq!(
            sorted.redeem_script().unwrap(),
            &build_multisig_redeemscript(&encoded, 2, false).unwrap()
        );
        assert_ne!(sorted.redeem_script(), unsorted.redeem_script());
        let position = encoded.iter().position(|e| *e == keys[2].to_bytes());
        assert_eq!(sorted.key_index(&keys[2]), position);
        assert!(position.is_some());
    }

    #[test]
    fn test_invalid_options() {
        let keys: Vec<PublicKey> = (1..=2).map(|i| key(i).pub_key()).collect();
        let p2pkh = InputOptions::new().keys(keys.clone()).script_type(ScriptType::P2pkh);
        assert!(Input::new(PREV, 0, p2pkh, Network::Bitcoin).is_err());

        let too_many = InputOptions::new().keys(keys).sigs_required(3);
        assert!(matches!(
            Input::new(PREV, 0, too_many, Network::Bitcoin),
            Err(TransactionError::Script(_))
        ));

        let nulldata = InputOptions::new().script_type(ScriptType::Nulldata);
        assert!(Input::new(PREV, 0, nulldata, Network::Bitcoin).is_err());
    }

    #[test]
    fn test_add_signature_by_key_position() {
        let keys: Vec<PublicKey> = (1..=3).map(|i| key(i).pub_key()).collect();
        let mut input = Input::new(PREV, 0, InputOptions::new().keys(keys).sigs_required(2), Network::Bitcoin).unwrap();
        let sig = |b: u8| {
            let mut s = vec![0x30, 0x06, 0x02, 0x01, b, 0x02, 0x01, 0x01];
            s.push(0x01);
            s
        };

        assert!(input.add_signature(2, sig(3)).unwrap());
        assert_eq!(input.status(), InputStatus::PartiallySigned);
        assert!(!input.add_signature(2, sig(3)).unwrap());
        assert!(input.add_signature(0, sig(1)).unwrap());
        assert_eq!(input.status(), InputStatus::FullySigned);
        assert!(!input.add_signature(1, sig(2)).unwrap());
        assert!(!input.add_signature(7, sig(2)).unwrap());

        let order: Vec<usize> = input.signatures().iter().map(|s| s.key_index).collect();
        assert_eq!(order, vec![0, 2]);

        let parsed = input.unlocking_script().parse().unwrap();
        assert_eq!(parsed.script_type(), ScriptType::P2shMultisig);
        assert_eq!(parsed.signatures(), &[sig(1), sig(3)][..]);
        assert_eq!(parsed.redeem_script(), input.redeem_script().map(Script::to_bytes));
    }

    #[test]
    fn test_wire_roundtrip() {
        let script = Script::from_hex(
            "473044022034519a85fb5299e180865dda936c5d53edabaaf6d15cd1740aac9878b76238e002207345fcb5a62deeb8d9d80e5\
             b412bd24d09151c2008b7fef10eb5f13e484d1e0d01210207c9ece04a9b5ef3ff441f3aad6bb63e323c05047a820ab45ebbe6\
             1385aa7446",
        )
        .unwrap();
        let input = Input::new(PREV, 3, InputOptions::new().unlocking_script(script).sequence(7), Network::Bitcoin)
            .unwrap();
        let mut writer = ByteWriter::new();
        input.write_to(&mut writer);
        let bytes = writer.into_bytes();

        let decoded = Input::read_from(&mut ByteReader::new(&bytes), 0, Network::Bitcoin).unwrap();
        assert_eq!(decoded.prev_hash(), input.prev_hash());
        assert_eq!(decoded.output_index(), 3);
        assert_eq!(decoded.sequence(), 7);
        assert_eq!(decoded.unlocking_script(), input.unlocking_script());
        assert_eq!(decoded.script_type(), ScriptType::P2pkh);
        assert_eq!(decoded.status(), InputStatus::FullySigned);
        // checked against the key on the next signing pass
        assert!(decoded.signatures().is_empty());

        assert!(Input::read_from(&mut ByteReader::new(&bytes[..40]), 0, Network::Bitcoin).is_err());
    }

    #[test]
    fn test_unclassifiable_unlocking_script() {
        let script = Script::from_hex("5152ae").unwrap();
        let input = Input::new(PREV, 0, InputOptions::new().unlocking_script(script), Network::Bitcoin).unwrap();
        assert_eq!(input.script_type(), ScriptType::Unknown);
        assert_eq!(input.address(), None);
    }
}
