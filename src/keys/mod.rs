// TOTP Warden — Keys Module
//
// Loads the 32-byte master key from its fixed, permission-restricted file.
// The key is read once at service construction and never leaves this
// process in any form; it is wiped from memory when the service drops.

mod error;
mod master;

pub use error::KeyError;
pub use master::{MasterKey, MASTER_KEY_LEN};
