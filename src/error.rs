use thiserror::Error;

/// Error type used for the library-level translation flow.
#[derive(Debug, Error)]
pub enum Error {
    /// The statement reader produced no statement for the input text.
    #[error("invalid sql query for string: {0}")]
    InvalidQuery(String),

    /// The statement is not a SELECT.
    #[error("not supported statement type {0}")]
    NotSupportedStatement(String),

    #[error("{0}")]
    InvalidSelectStatement(String),

    /// Plain projected fields that are absent from the GROUP BY clause.
    #[error("cannot select field(s) not in group by clause: {}", .0.join(", "))]
    InvalidSelectField(Vec<String>),

    #[error("not supported \"{0}\" aggregate function")]
    NotSupportedAggregateFunction(String),

    /// Postfix or expression-tree input that cannot form a well-shaped tree.
    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    /// A registered inline-function builder rejected its payload.
    #[error("inline function {name}('{payload}') failed: {source}")]
    InlineFunction {
        name: String,
        payload: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
