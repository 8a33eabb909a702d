//! Signature hash computation for transaction signing.
//!
//! Computes the legacy (pre-segwit, pre-forkid) signature hash: a copy of
//! the transaction with the signed input's script replaced by the subscript
//! and the other inputs' scripts emptied, trimmed according to the sighash
//! type, followed by the 4-byte type, double-SHA256 hashed.

use log::trace;
use txkit_primitives::hash::sha256d;
use txkit_primitives::util::{ByteWriter, VarInt};
use txkit_script::chunk::Chunks;
use txkit_script::opcodes::OP_CODESEPARATOR;

use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs, allowing outputs to be modified.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with another flag: only sign the current input, allowing other
/// inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

/// Digest signed by SIGHASH_SINGLE when the input has no matching output:
/// the number one as a little-endian 256-bit integer.
pub const SIGHASH_SINGLE_ONE: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

// -----------------------------------------------------------------------
// Legacy signature hash
// -----------------------------------------------------------------------

/// Compute the legacy signature hash for a given input.
///
/// # Arguments
/// * `tx`           - The transaction being signed.
/// * `input_index`  - Index of the input being signed.
/// * `subscript`    - The locking script being satisfied, or the redeem script for P2SH.
/// * `sighash_type` - The sighash flags (e.g. `SIGHASH_ALL`).
///
/// # Returns
/// A 32-byte double-SHA256 hash to be signed by ECDSA.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    subscript: &[u8],
    sighash_type: u32,
) -> Result<[u8; 32], TransactionError> {
    check_index(tx, input_index)?;
    if sighash_type & SIGHASH_MASK == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        return Ok(SIGHASH_SINGLE_ONE);
    }
    let digest = sha256d(&calc_preimage(tx, input_index, subscript, sighash_type)?);
    trace!(
        "sighash for input {} type 0x{:02x}: {}",
        input_index,
        sighash_type,
        hex::encode(digest)
    );
    Ok(digest)
}

/// Build the legacy sighash preimage before double-hashing.
///
/// The preimage is the transaction serialized with:
/// 1. the signed input's script replaced by `subscript` (OP_CODESEPARATORs removed)
///    and every other input's script emptied;
/// 2. only the signed input kept, under ANYONECANPAY;
/// 3. other inputs' sequences zeroed, under NONE and SINGLE;
/// 4. no outputs under NONE, outputs up to the input's index under SINGLE
///    with the earlier ones blanked to amount -1 and an empty script;
/// 5. the sighash type appended as 4 bytes LE.
///
/// # Returns
/// The raw preimage, or `SigningError` for SINGLE without a matching
/// output (that case signs [`SIGHASH_SINGLE_ONE`] instead).
pub fn calc_preimage(
    tx: &Transaction,
    input_index: usize,
    subscript: &[u8],
    sighash_type: u32,
) -> Result<Vec<u8>, TransactionError> {
    check_index(tx, input_index)?;
    let base_type = sighash_type & SIGHASH_MASK;
    let anyone_can_pay = sighash_type & SIGHASH_ANYONECANPAY != 0;
    if base_type == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        return Err(TransactionError::SigningError(format!(
            "SIGHASH_SINGLE input {} has no matching output",
            input_index
        )));
    }

    let script_code = strip_code_separators(subscript);
    let mut writer = ByteWriter::with_capacity(256);
    writer.write_u32_le(tx.version);

    // Inputs
    if anyone_can_pay {
        writer.write_varint(VarInt::from(1u64));
    } else {
        writer.write_varint(VarInt::from(tx.inputs.len()));
    }
    for (i, input) in tx.inputs.iter().enumerate() {
        let signing = i == input_index;
        if anyone_can_pay && !signing {
            continue;
        }
        writer.write_bytes(input.prev_hash().as_bytes());
        writer.write_u32_le(input.output_index());
        if signing {
            writer.write_varstring(&script_code);
        } else {
            writer.write_varint(VarInt::from(0u64));
        }
        let zero_sequence = !signing && (base_type == SIGHASH_NONE || base_type == SIGHASH_SINGLE);
        writer.write_u32_le(if zero_sequence { 0 } else { input.sequence() });
    }

    // Outputs
    match base_type {
        SIGHASH_NONE => writer.write_varint(VarInt::from(0u64)),
        SIGHASH_SINGLE => {
            writer.write_varint(VarInt::from(input_index + 1));
            for _ in 0..input_index {
                writer.write_u64_le(u64::MAX);
                writer.write_varint(VarInt::from(0u64));
            }
            tx.outputs[input_index].write_to(&mut writer);
        }
        _ => {
            writer.write_varint(VarInt::from(tx.outputs.len()));
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
    }

    writer.write_u32_le(tx.locktime);
    writer.write_u32_le(sighash_type);
    Ok(writer.into_bytes())
}

// -----------------------------------------------------------------------
// Internal helper functions
// -----------------------------------------------------------------------

fn check_index(tx: &Transaction, input_index: usize) -> Result<(), TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InputIndex {
            index: input_index,
            count: tx.inputs.len(),
        });
    }
    Ok(())
}

/// Remove every OP_CODESEPARATOR opcode from a script, including any that
/// follow an OP_RETURN.
///
/// Bytes from an unparseable tail are kept unchanged.
fn strip_code_separators(script: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(script.len());
    let mut chunks = Chunks::opcodes(script);
    let mut start = 0;
    while let Some(chunk) = chunks.next() {
        let end = chunks.position();
        match chunk {
            Ok(chunk) if chunk.op == OP_CODESEPARATOR => {}
            Ok(_) => out.extend_from_slice(&script[start..end]),
            Err(_) => {
                out.extend_from_slice(&script[start..]);
                break;
            }
        }
        start = end;
    }
    out
}
