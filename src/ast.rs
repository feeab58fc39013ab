//! # Statement model
//!
//! This module defines the data the translator consumes: the lexical tokens of
//! the SQL subset, the parsed SELECT statement with its flat WHERE/HAVING
//! condition lists, the closed operator and function enumerations, and the
//! arithmetic expression tree used for select-list expressions.
//!
//! ## Submodules
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[statement]** - Statements, select items, condition nodes, group/order/limit/hints
//! - **[operators]** - Arithmetic, comparison, query and aggregate operators
//! - **[expressions]** - Arithmetic expression tree
//!
//! ## Condition lists
//!
//! WHERE and HAVING are not parsed into a boolean tree. The reader splits them
//! at every `AND` / `OR` and keeps the raw text of each comparison, so
//!
//! ```text
//! WHERE role = 'admin' or (age > 12 and age < 60)
//! ```
//!
//! becomes the five nodes
//!
//! ```text
//! role = 'admin' | OR | (age > 12 | AND | age < 60)
//! ```
//!
//! and the [condition reducer](crate::condition) rebuilds the tree from the
//! bracket depth of each node.
pub mod expressions;
pub mod operators;
pub mod statement;
pub mod tokens;

pub use expressions::ExprTree;
pub use operators::{AggregateFunction, ArithmeticOp, ComparisonOp, QueryOperator};
pub use statement::{
    Condition, GroupItem, IndexHint, IndexHintKind, Limit, OrderItem, SelectExpression,
    SelectStatement, SortDirection, Statement, TableReference,
};
pub use tokens::{Span, Spanned, Token};
