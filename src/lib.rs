//! Translate SQL SELECT statements into MongoDB queries.
//!
//! A statement without grouping becomes a find query (filter, projection,
//! sort, skip, limit, hint); one with GROUP BY or aggregate functions becomes
//! an aggregation pipeline.
//!
//! ```
//! use bson::doc;
//! use sql_to_mongodb_query::{Query, SqlToMongo};
//!
//! let query = SqlToMongo::new()
//!     .parse("SELECT user_id, count(*) FROM logs GROUP BY user_id")
//!     .unwrap()
//!     .unwrap();
//!
//! let Query::Aggregate(aggregate) = query else { panic!("expected a pipeline") };
//! assert_eq!(
//!     aggregate.pipeline_documents()[1],
//!     doc! { "$group": { "_id": { "user_id": "$user_id" }, "count(*)": { "$sum": 1 } } }
//! );
//! ```

pub mod aggregate;
pub mod ast;
pub mod condition;
pub mod error;
pub mod expression;
pub mod filter;
pub mod inline;
pub mod lexer;
pub mod operator;
pub mod output;
pub mod parser;
pub mod postfix;
pub mod query;
pub mod translator;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{ExprTree, Statement, Token};
pub use error::{Error, Result};
pub use filter::{Filter, Predicate};
pub use inline::{BuilderError, InlineFunctionRegistry};
pub use lexer::{LexError, Lexer, Position};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser, parse_statement};
pub use query::{Aggregate, FindOptions, FindQuery, Query, Stage};
pub use translator::{SqlToMongo, translate};
