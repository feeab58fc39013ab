//! Translate SQL into MongoDB query JSON

use super::CliError;
use crate::SqlToMongo;
use crate::output::{to_json, to_json_pretty};

/// Options for the translate command
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// The SELECT statement to translate
    pub sql: String,
    /// Pretty-print the output
    pub pretty: bool,
}

/// Translate a statement and render it as JSON
pub fn execute_translate(options: &TranslateOptions) -> Result<String, CliError> {
    let sql = options.sql.trim();
    if sql.is_empty() {
        return Err(CliError::NoInput);
    }

    let query = SqlToMongo::new()
        .parse(sql)?
        .ok_or(CliError::NoCollection)?;

    Ok(if options.pretty {
        to_json_pretty(&query)
    } else {
        to_json(&query)
    })
}
