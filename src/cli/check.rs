//! Validate SQL without printing the translation

use super::CliError;
use crate::{Query, SqlToMongo};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The SELECT statement to check
    pub sql: String,
}

/// Result of a check operation
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    /// Translates to a find query
    Find { collection: String },
    /// Translates to an aggregation pipeline
    Aggregate { collection: String, stages: usize },
}

impl std::fmt::Display for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckResult::Find { collection } => write!(f, "OK: find on '{}'", collection),
            CheckResult::Aggregate { collection, stages } => {
                write!(f, "OK: aggregate on '{}' ({} stages)", collection, stages)
            }
        }
    }
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let sql = options.sql.trim();
    if sql.is_empty() {
        return Err(CliError::NoInput);
    }

    match SqlToMongo::new().parse(sql)? {
        Some(Query::Find(find)) => Ok(CheckResult::Find {
            collection: find.collection,
        }),
        Some(Query::Aggregate(aggregate)) => Ok(CheckResult::Aggregate {
            stages: aggregate.pipeline.len(),
            collection: aggregate.collection,
        }),
        None => Err(CliError::NoCollection),
    }
}
