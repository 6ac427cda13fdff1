//! CLI command implementations
//!
//! Handles all command-line interface operations:
//! - inspect: Summarize a stored index
//! - symbol: Look up one symbol by USR
//! - dump: Print a whole index as JSON
//! - check: Verify an index decodes completely
//! - stale: Compare recorded header mtimes with the filesystem
//! - completions: Print a completion response
//! - normalize: Re-encode an index

mod commands;
mod index_utils;

pub use commands::*;
pub use index_utils::*;
