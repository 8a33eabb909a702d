/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Raw transaction bytes are truncated, malformed or have trailing data.
    #[error("decode error: {0}")]
    Decode(String),
    /// An input could not be constructed from the given values.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// An output could not be constructed from the given values.
    #[error("invalid output: {0}")]
    InvalidOutput(String),
    /// An input index past the end of the input list.
    #[error("input index {index} out of range (tx has {count} inputs)")]
    InputIndex { index: usize, count: usize },
    /// An input that cannot be signed (e.g. no known public key or redeem script).
    #[error("signing error: {0}")]
    SigningError(String),
    /// An underlying script error (forwarded from `txkit-script`).
    #[error("script error: {0}")]
    Script(#[from] txkit_script::ScriptError),
    /// An underlying primitives error (forwarded from `txkit-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] txkit_primitives::PrimitivesError),
}
