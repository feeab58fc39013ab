//! CLI support for sql-to-mongodb-query
//!
//! Provides programmatic access to the `sql2mongo` commands for embedding
//! in other tools.

mod check;
mod translate;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use translate::{TranslateOptions, execute_translate};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Translation error
    Translate(crate::Error),
    /// IO error
    Io(io::Error),
    /// No SQL provided
    NoInput,
    /// The statement names no collection
    NoCollection,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Translate(e) => write!(f, "Translation error: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => write!(f, "No SQL provided. Pass it as an argument or pipe it to stdin."),
            CliError::NoCollection => write!(f, "Statement has no FROM table, nothing to translate."),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Translate(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::Error> for CliError {
    fn from(e: crate::Error) -> Self {
        CliError::Translate(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
