//! Command-line front end for folio.
//!
//! `main.rs` parses arguments, builds a [`CliContext`] through [`bootstrap`]
//! and dispatches to [`handlers`].

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliConfig, CliContext, bootstrap, bootstrap_with};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
