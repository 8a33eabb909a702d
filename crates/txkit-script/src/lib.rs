/// txkit - Script parsing, classification, construction and addresses.
///
/// Provides the Script byte type, opcode definitions, a lazy chunk parser,
/// classification of scripts into standard shapes, builders for locking
/// and redeem scripts, and the Base58Check address codec.

pub mod script;
pub mod opcodes;
pub mod chunk;
pub mod classify;
pub mod address;

mod error;
pub use error::ScriptError;
pub use script::Script;
pub use address::{decode_address, encode_address, Address, AddressType};
pub use chunk::ScriptChunk;
pub use classify::{
    address_from_script, build_multisig_redeemscript, nulldata_script, p2pkh_lock, p2sh_lock, parse_script,
    script_to_string, ParsedScript, ScriptType,
};
