#![forbid(unsafe_code)]

//! Binary entrypoint for the Artie CLI.

use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let exit_code = artie_cli::run().await;
    process::exit(exit_code);
}
