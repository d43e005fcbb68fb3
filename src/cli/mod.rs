// CLI module for ferrotag
//
// Command-line functionality on top of the library. Only compiled into
// the binary, not into the library.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{Commands, Config, OutputFormat};
pub use output::OutputFormatter;
