// TOTP Warden — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: enroll, keygen. Operator flags may relocate the key file
// and secret root; nothing here can change the pinned generator
// executable or its argument vector.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// TOTP Warden — privileged TOTP enrollment proxy.
#[derive(Parser, Debug)]
#[command(name = "totp-warden")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision a TOTP enrollment for an account and print the QR URL.
    Enroll {
        /// Account to enroll (plain filename component, no separators).
        account: String,

        /// Master key file (32 raw bytes).
        #[arg(long)]
        key_file: Option<PathBuf>,

        /// Directory receiving per-account ciphertext files.
        #[arg(long)]
        secret_root: Option<PathBuf>,

        /// UID allowed to request enrollment (repeatable). Defaults to root only.
        #[arg(long = "allow-uid")]
        allow_uid: Vec<u32>,

        /// GID allowed to request enrollment (repeatable).
        #[arg(long = "allow-gid")]
        allow_gid: Vec<u32>,
    },

    /// Generate a fresh 32-byte master key file with owner-only permissions.
    Keygen {
        /// Where to write the key. Defaults to the fixed service path.
        #[arg(long)]
        key_file: Option<PathBuf>,

        /// Overwrite an existing key file. Destroys access to all
        /// previously stored secrets.
        #[arg(long)]
        force: bool,
    },
}
