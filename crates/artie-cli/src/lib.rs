#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line client for the Artie deployment API.
//!
//! Layout:
//! - `cli.rs`: argument parsing, command dispatch, and the entry sequence
//! - `commands/`: command handlers grouped by API resource
//! - `client.rs`: authenticated HTTP request helper and error types
//! - `config.rs`: environment-derived settings
//! - `output.rs`: renderers for deployment and table listings
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod config;
pub(crate) mod output;

pub use cli::run;
