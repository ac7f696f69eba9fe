// TOTP Warden — Store Module
//
// Persists one encrypted blob per account under the secure root with
// owner-only permissions. Nothing in this module ever reads a stored
// blob back; read-back belongs to the consumers of the files.

mod error;
mod persister;

pub use error::StoreError;
pub use persister::{validate_account_name, SecretFileStore, SECRET_FILE_EXT};
