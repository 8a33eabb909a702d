//! Script classification and construction.
//!
//! `parse_script` recognises the standard locking and unlocking script
//! shapes and extracts the keys, signatures and hashes they embed.
//! `ParsedScript::to_script` is its inverse.

use std::fmt;

use log::trace;
use serde::{Serialize, Serializer};
use txkit_primitives::hash::hash160;
use txkit_primitives::Network;

use crate::address::{encode_address, AddressType};
use crate::chunk::{Chunks, ScriptChunk};
use crate::opcodes::*;
use crate::script::Script;
use crate::ScriptError;

/// Name of a script shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptType {
    P2pkh,
    P2sh,
    P2shMultisig,
    Multisig,
    SigPubkey,
    Pubkey,
    Nulldata,
    /// Only ever assigned to inputs, from their previous outpoint.
    Coinbase,
    Empty,
    Unknown,
}

impl ScriptType {
    /// The lowercase name used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::P2pkh => "p2pkh",
            ScriptType::P2sh => "p2sh",
            ScriptType::P2shMultisig => "p2sh_multisig",
            ScriptType::Multisig => "multisig",
            ScriptType::SigPubkey => "sig_pubkey",
            ScriptType::Pubkey => "pubkey",
            ScriptType::Nulldata => "nulldata",
            ScriptType::Coinbase => "coinbase",
            ScriptType::Empty => "empty",
            ScriptType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ScriptType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A classified script together with the data it embeds.
///
/// Keys and signatures are kept as raw pushed bytes. Signatures include
/// their trailing sighash-type byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedScript {
    Empty,
    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
    P2pkh { hash: [u8; 20] },
    /// `OP_HASH160 <hash> OP_EQUAL`
    P2sh { hash: [u8; 20] },
    /// `OP_RETURN` followed by `payload`, unparsed.
    Nulldata { payload: Vec<u8> },
    /// `OP_m <key>... OP_n OP_CHECKMULTISIG`
    Multisig {
        m: usize,
        n: usize,
        keys: Vec<Vec<u8>>,
    },
    /// `<sig>... <key>...`, the unlocking script of a key-based output.
    SigPubkey {
        signatures: Vec<Vec<u8>>,
        keys: Vec<Vec<u8>>,
    },
    /// `OP_0 <sig>... <redeem script>` where the redeem script is multisig.
    P2shMultisig {
        signatures: Vec<Vec<u8>>,
        m: usize,
        n: usize,
        keys: Vec<Vec<u8>>,
        redeem_script: Vec<u8>,
    },
    /// `<key> OP_CHECKSIG`
    Pubkey { key: Vec<u8> },
    Unknown,
}

impl ParsedScript {
    pub fn script_type(&self) -> ScriptType {
        match self {
            ParsedScript::Empty => ScriptType::Empty,
            ParsedScript::P2pkh { .. } => ScriptType::P2pkh,
            ParsedScript::P2sh { .. } => ScriptType::P2sh,
            ParsedScript::Nulldata { .. } => ScriptType::Nulldata,
            ParsedScript::Multisig { .. } => ScriptType::Multisig,
            ParsedScript::SigPubkey { .. } => ScriptType::SigPubkey,
            ParsedScript::P2shMultisig { .. } => ScriptType::P2shMultisig,
            ParsedScript::Pubkey { .. } => ScriptType::Pubkey,
            ParsedScript::Unknown => ScriptType::Unknown,
        }
    }

    /// Public keys embedded in the script, in script order.
    pub fn keys(&self) -> &[Vec<u8>] {
        match self {
            ParsedScript::Multisig { keys, .. }
            | ParsedScript::SigPubkey { keys, .. }
            | ParsedScript::P2shMultisig { keys, .. } => keys,
            ParsedScript::Pubkey { key } => std::slice::from_ref(key),
            _ => &[],
        }
    }

    /// Signatures embedded in the script, in script order.
    pub fn signatures(&self) -> &[Vec<u8>] {
        match self {
            ParsedScript::SigPubkey { signatures, .. } | ParsedScript::P2shMultisig { signatures, .. } => {
                signatures
            }
            _ => &[],
        }
    }

    /// Signatures needed to spend: m for multisig, one for key-based shapes.
    pub fn sigs_required(&self) -> usize {
        match self {
            ParsedScript::Multisig { m, .. } | ParsedScript::P2shMultisig { m, .. } => *m,
            ParsedScript::P2pkh { .. } | ParsedScript::Pubkey { .. } | ParsedScript::SigPubkey { .. } => 1,
            _ => 0,
        }
    }

    /// Keys that may sign: n for multisig, one for key-based shapes.
    pub fn sigs_total(&self) -> usize {
        match self {
            ParsedScript::Multisig { n, .. } | ParsedScript::P2shMultisig { n, .. } => *n,
            ParsedScript::P2pkh { .. } | ParsedScript::Pubkey { .. } | ParsedScript::SigPubkey { .. } => 1,
            _ => 0,
        }
    }

    /// The 20-byte hash of a P2PKH or P2SH locking script.
    pub fn hash(&self) -> Option<[u8; 20]> {
        match self {
            ParsedScript::P2pkh { hash } | ParsedScript::P2sh { hash } => Some(*hash),
            _ => None,
        }
    }

    /// The bytes following OP_RETURN in a nulldata script.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            ParsedScript::Nulldata { payload } => Some(payload),
            _ => None,
        }
    }

    /// The redeem script revealed by a P2SH multisig unlocking script.
    pub fn redeem_script(&self) -> Option<&[u8]> {
        match self {
            ParsedScript::P2shMultisig { redeem_script, .. } => Some(redeem_script),
            _ => None,
        }
    }

    /// Build the script bytes for this shape.
    ///
    /// # Returns
    /// The script, or `Unbuildable` for `Unknown`.
    pub fn to_script(&self) -> Result<Script, ScriptError> {
        match self {
            ParsedScript::Empty => Ok(Script::new()),
            ParsedScript::P2pkh { hash } => Ok(p2pkh_lock(hash)),
            ParsedScript::P2sh { hash } => Ok(p2sh_lock(hash)),
            ParsedScript::Nulldata { payload } => {
                let mut bytes = Vec::with_capacity(payload.len() + 1);
                bytes.push(OP_RETURN);
                bytes.extend_from_slice(payload);
                Ok(Script::from(bytes))
            }
            ParsedScript::Multisig { m, keys, .. } => build_multisig_redeemscript(keys, *m, false),
            ParsedScript::SigPubkey { signatures, keys } => {
                let mut script = Script::new();
                for push in signatures.iter().chain(keys) {
                    script.append_push_data(push)?;
                }
                Ok(script)
            }
            ParsedScript::P2shMultisig {
                signatures,
                redeem_script,
                ..
            } => {
                let mut script = Script::from_bytes(&[OP_0]);
                for sig in signatures {
                    script.append_push_data(sig)?;
                }
                script.append_push_data(redeem_script)?;
                Ok(script)
            }
            ParsedScript::Pubkey { key } => {
                let mut script = Script::new();
                script.append_push_data(key)?;
                script.append_opcodes(&[OP_CHECKSIG])?;
                Ok(script)
            }
            ParsedScript::Unknown => Err(ScriptError::Unbuildable(ScriptType::Unknown.as_str())),
        }
    }

    /// The address this script pays to or spends from, if it has one.
    pub fn address(&self, network: Network) -> Option<String> {
        let (hash, kind) = match self {
            ParsedScript::P2pkh { hash } => (*hash, AddressType::P2pkh),
            ParsedScript::P2sh { hash } => (*hash, AddressType::P2sh),
            ParsedScript::Pubkey { key } => (hash160(key), AddressType::P2pkh),
            ParsedScript::SigPubkey { keys, .. } => (hash160(keys.first()?), AddressType::P2pkh),
            ParsedScript::P2shMultisig { redeem_script, .. } => (hash160(redeem_script), AddressType::P2sh),
            _ => return None,
        };
        Some(encode_address(&hash, kind, network))
    }
}

// ---------------------------------------------------------------------------
// Push shape heuristics
// ---------------------------------------------------------------------------

/// A push that looks like a DER signature with a sighash-type byte appended.
pub fn is_der_signature(data: &[u8]) -> bool {
    (9..=73).contains(&data.len()) && data[0] == 0x30 && data[1] as usize == data.len() - 3
}

/// A push that looks like a SEC1 public key (hybrid 06/07 prefixes included).
pub fn is_public_key(data: &[u8]) -> bool {
    match (data.len(), data.first()) {
        (33, Some(0x02 | 0x03)) => true,
        (65, Some(0x04 | 0x06 | 0x07)) => true,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Classify raw script bytes.
///
/// Shapes are tried in a fixed order: empty, P2PKH, P2SH, nulldata, bare
/// multisig, P2SH multisig unlocking script, signatures followed by keys,
/// bare public key. Anything else is `Unknown`.
///
/// # Returns
/// The classified script, or a classification error for a script that
/// starts like a multisig script but is malformed.
pub fn parse_script(bytes: &[u8]) -> Result<ParsedScript, ScriptError> {
    let parsed = classify(bytes)?;
    trace!("classified {}-byte script as {}", bytes.len(), parsed.script_type());
    Ok(parsed)
}

fn classify(bytes: &[u8]) -> Result<ParsedScript, ScriptError> {
    if bytes.is_empty() {
        return Ok(ParsedScript::Empty);
    }
    let script = Script::from_bytes(bytes);
    if script.is_p2pkh() {
        return Ok(ParsedScript::P2pkh {
            hash: hash20(&bytes[3..23]),
        });
    }
    if script.is_p2sh() {
        return Ok(ParsedScript::P2sh {
            hash: hash20(&bytes[2..22]),
        });
    }
    if script.is_nulldata() {
        return Ok(ParsedScript::Nulldata {
            payload: bytes[1..].to_vec(),
        });
    }
    if bytes.len() > 1 && is_small_int_op(bytes[0]) {
        let (m, n, keys) = parse_multisig(bytes)?;
        return Ok(ParsedScript::Multisig { m, n, keys });
    }

    // The remaining shapes are push-only; a truncated push rules them out.
    let Ok(pushes) = Chunks::new(bytes)
        .map(|chunk| chunk.map(|c| c.push_data().map(<[u8]>::to_vec)))
        .collect::<Result<Option<Vec<Vec<u8>>>, _>>()
    else {
        return Ok(pubkey_or_unknown(bytes));
    };
    let Some(pushes) = pushes else {
        return Ok(pubkey_or_unknown(bytes));
    };

    if let Some(parsed) = p2sh_multisig(bytes[0], &pushes) {
        return Ok(parsed);
    }
    if let Some(parsed) = sig_pubkey(&pushes) {
        return Ok(parsed);
    }
    Ok(ParsedScript::Unknown)
}

fn hash20(bytes: &[u8]) -> [u8; 20] {
    let mut hash = [0u8; 20];
    hash.copy_from_slice(bytes);
    hash
}

/// Parse `OP_m <key>... OP_n OP_CHECKMULTISIG`.
///
/// Chunks are read lazily so that a bad count opcode is reported even
/// when later pushes are truncated.
fn parse_multisig(bytes: &[u8]) -> Result<(usize, usize, Vec<Vec<u8>>), ScriptError> {
    let mut chunks = Chunks::new(bytes);

    let first = next_chunk(&mut chunks)?;
    let m = small_int_value(first.op).ok_or(ScriptError::InvalidOpN(first.op))?;

    let mut keys = Vec::new();
    let count_op = loop {
        let chunk = next_chunk(&mut chunks)?;
        match chunk.push_data() {
            Some(data) if is_public_key(data) => keys.push(data.to_vec()),
            _ => break chunk.op,
        }
    };
    let n = small_int_value(count_op).ok_or(ScriptError::InvalidOpN(count_op))?;
    if keys.len() != n {
        return Err(ScriptError::KeyCountMismatch {
            found: keys.len(),
            expected: n,
        });
    }
    if m > n {
        return Err(ScriptError::InvalidMultisig { m, n });
    }

    let last = next_chunk(&mut chunks)?;
    if last.op != OP_CHECKMULTISIG || chunks.next().is_some() {
        return Err(ScriptError::InvalidScript(
            "multisig script must end with a single OP_CHECKMULTISIG".to_string(),
        ));
    }
    Ok((m, n, keys))
}

fn next_chunk(chunks: &mut Chunks<'_>) -> Result<ScriptChunk, ScriptError> {
    chunks
        .next()
        .unwrap_or_else(|| Err(ScriptError::InvalidScript("multisig script ends early".to_string())))
}

fn p2sh_multisig(first_op: u8, pushes: &[Vec<u8>]) -> Option<ParsedScript> {
    if first_op != OP_0 || pushes.len() < 2 {
        return None;
    }
    let (redeem, middle) = pushes[1..].split_last()?;
    // Empty pushes are placeholders for signatures not yet collected.
    if !middle.iter().all(|p| p.is_empty() || is_der_signature(p)) {
        return None;
    }
    if redeem.len() < 2 || !is_small_int_op(redeem[0]) {
        return None;
    }
    let (m, n, keys) = parse_multisig(redeem).ok()?;
    Some(ParsedScript::P2shMultisig {
        signatures: middle.iter().filter(|p| !p.is_empty()).cloned().collect(),
        m,
        n,
        keys,
        redeem_script: redeem.clone(),
    })
}

fn sig_pubkey(pushes: &[Vec<u8>]) -> Option<ParsedScript> {
    let sig_count = pushes.iter().take_while(|p| is_der_signature(p)).count();
    let rest = &pushes[sig_count..];
    if sig_count == 0 || rest.is_empty() || !rest.iter().all(|p| is_public_key(p)) {
        return None;
    }
    Some(ParsedScript::SigPubkey {
        signatures: pushes[..sig_count].to_vec(),
        keys: rest.to_vec(),
    })
}

fn pubkey_or_unknown(bytes: &[u8]) -> ParsedScript {
    match bytes.split_last() {
        Some((&OP_CHECKSIG, [len, key @ ..])) if *len as usize == key.len() && is_public_key(key) => {
            ParsedScript::Pubkey { key: key.to_vec() }
        }
        _ => ParsedScript::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_lock(hash: &[u8; 20]) -> Script {
    let mut bytes = Vec::with_capacity(25);
    bytes.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
    bytes.extend_from_slice(hash);
    bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    Script::from(bytes)
}

/// `OP_HASH160 <hash> OP_EQUAL`
pub fn p2sh_lock(hash: &[u8; 20]) -> Script {
    let mut bytes = Vec::with_capacity(23);
    bytes.extend_from_slice(&[OP_HASH160, OP_DATA_20]);
    bytes.extend_from_slice(hash);
    bytes.push(OP_EQUAL);
    Script::from(bytes)
}

/// `OP_RETURN <data>`, with `data` as a single minimal push.
pub fn nulldata_script(data: &[u8]) -> Result<Script, ScriptError> {
    let mut script = Script::from_bytes(&[OP_RETURN]);
    if !data.is_empty() {
        script.append_push_data(data)?;
    }
    Ok(script)
}

/// Build `OP_m <key_1>...<key_n> OP_n OP_CHECKMULTISIG`.
///
/// # Arguments
/// * `keys` - Encoded public keys, compressed or uncompressed.
/// * `m` - Number of signatures required.
/// * `sort` - Order keys by their encoded bytes; otherwise keep the given order.
///
/// # Returns
/// The redeem script, or `InvalidMultisig` unless `1 <= m <= n <= 16`.
pub fn build_multisig_redeemscript<K: AsRef<[u8]>>(keys: &[K], m: usize, sort: bool) -> Result<Script, ScriptError> {
    let n = keys.len();
    let (Some(m_op), Some(n_op)) = (small_int_op(m), small_int_op(n)) else {
        return Err(ScriptError::InvalidMultisig { m, n });
    };
    if m > n {
        return Err(ScriptError::InvalidMultisig { m, n });
    }

    let mut ordered: Vec<&[u8]> = keys.iter().map(AsRef::as_ref).collect();
    if sort {
        ordered.sort();
    }

    let mut script = Script::from_bytes(&[m_op]);
    for key in ordered {
        script.append_push_data(key)?;
    }
    script.append_opcodes(&[n_op, OP_CHECKMULTISIG])?;
    Ok(script)
}

/// Render script bytes as space-separated mnemonics and hex pushes.
pub fn script_to_string(bytes: &[u8]) -> String {
    Script::from_bytes(bytes).to_display_string()
}

/// Derive the address a script pays to, or `None` when it has none or
/// cannot be classified.
pub fn address_from_script(bytes: &[u8], network: Network) -> Option<String> {
    parse_script(bytes).ok()?.address(network)
}
