#![deny(missing_docs)]

//! txkit - Standalone UTXO transaction engine.
//!
//! Re-exports the txkit crates for single-crate usage: byte codec, hashes,
//! keys and networks (`primitives`), script parsing, classification and
//! addresses (`script`), and transaction building, signing and
//! verification (`transaction`).

pub use txkit_primitives as primitives;
pub use txkit_script as script;
pub use txkit_transaction as transaction;

pub use txkit_primitives::ec::{PrivateKey, PublicKey};
pub use txkit_primitives::Network;
pub use txkit_script::{Script, ScriptType};
pub use txkit_transaction::{Input, InputOptions, InputStatus, Output, Transaction, TransactionError};
