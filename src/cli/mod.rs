//! CLI module
//!
//! Command-line interface over the client.
//!
//! # Commands
//!
//! - `get` - Retrieve a patient by NHS number
//! - `search` - Search for patients
//! - `assertion` - Print a signed client assertion
//! - `validate` - Check an NHS number offline

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, SearchArgs};
pub use runner::Runner;
