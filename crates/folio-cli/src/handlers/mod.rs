//! Command handlers.
//!
//! Each handler takes the composed context and prints its result; errors
//! bubble up as [`crate::CliError`].

pub mod daemon;
pub mod evict;
pub mod fetch;
pub mod paths;
pub mod scrub;
