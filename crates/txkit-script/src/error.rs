/// Error types for script operations.
///
/// Covers chunk decoding, classification failures, script construction
/// and address encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Generic invalid script error.
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// A multisig script used a byte other than OP_1..OP_16 where a count was expected.
    #[error("{0} is not an op_n code")]
    InvalidOpN(u8),

    /// The number of keys in a multisig script disagrees with its key count.
    #[error("{found} signatures found, but {expected} sigs expected")]
    KeyCountMismatch { found: usize, expected: usize },

    /// A multisig threshold outside `1..=n` or a key count above 16.
    #[error("invalid multisig parameters: {m} of {n}")]
    InvalidMultisig { m: usize, n: usize },

    /// Attempted to use append_opcodes for a push data opcode.
    #[error("use append_push_data for push data opcodes: {0}")]
    InvalidOpcodeType(String),

    /// A script type that has no byte form on its own.
    #[error("cannot build a script of type {0}")]
    Unbuildable(&'static str),

    /// Invalid address string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Address version byte is not one of the known networks.
    #[error("unsupported address version 0x{0:02x}")]
    UnsupportedAddressVersion(u8),

    /// Hex decoding error.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Not enough data in script to complete a push operation.
    #[error("not enough data for push at offset {0}")]
    DataTooSmall(usize),

    /// Push data exceeds maximum allowed size.
    #[error("data too big")]
    DataTooBig,

    /// A push data part exceeds protocol limits.
    #[error("part too big '{0}'")]
    PartTooBig(usize),

    /// Error from primitives crate.
    #[error("primitives error: {0}")]
    Primitives(#[from] txkit_primitives::PrimitivesError),
}
