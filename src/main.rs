// TOTP Warden — Application Entry Point
//
// Parses CLI arguments, initializes structured logging (which never
// carries secret values at any level), and dispatches to the command
// handler. Failure details go to the operator's stderr/log only; the
// process exit code is the caller-facing signal.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use totp_warden::cli::{execute, Cli};

fn main() {
    // RUST_LOG=totp_warden=debug for verbose output; default is `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("totp_warden=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
