/// txkit - Transaction codec, signing and verification.
///
/// Provides the Transaction type with classified inputs and outputs,
/// legacy signature hash computation, key-ordered multisig signature
/// aggregation, verification and raw/hex/JSON serialization.

pub mod transaction;
pub mod input;
pub mod output;
pub mod sighash;

mod error;
pub use error::TransactionError;
pub use transaction::Transaction;
pub use input::{Input, InputOptions, InputStatus, KeySignature};
pub use output::Output;
