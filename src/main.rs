//! build-installer - assembles the RBTools Windows installer.
//!
//! Run from `<tree>/contrib/installers/windows` with no arguments.

use installer_build::cli::{self, Args};
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse_args();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    // Run CLI and get exit code
    let exit_code = match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}
