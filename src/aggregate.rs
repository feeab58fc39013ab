//! Select-list functions → `$group` accumulators and `$project` entries.
//!
//! A single aggregate such as `sum(cost)` becomes one accumulator keyed by
//! its text and a projection reading it back:
//!
//! ```text
//! sum(cost) as total  ->  $group:   {"sum(cost)": {$sum: "$cost"}}
//!                         $project: {total: "$sum(cost)"}
//! ```
//!
//! Arithmetic over aggregates registers each aggregate once and projects the
//! arithmetic:
//!
//! ```text
//! sum(cost) / count(*)  ->  $group:   {"sum(cost)": {$sum: "$cost"}, "count(*)": {$sum: 1}}
//!                           $project: {"sum(cost) / count(*)": {$divide: ["$sum(cost)", "$count(*)"]}}
//! ```
//!
//! An aggregate over an expression (`sum(a + b)`) is registered under a
//! `__tmp_expression_<hash>` key derived from its content, so the same
//! expression written twice shares one accumulator.

use bson::{Bson, Document, doc};

use crate::{
    ast::{AggregateFunction, ExprTree, SelectExpression},
    error::{Error, Result},
    expression::parse_expression,
    postfix::is_math_expression,
    value::numeric_bson,
};

/// Prefix of accumulator keys generated for aggregates over expressions.
pub const TMP_EXPRESSION_PREFIX: &str = "__tmp_expression_";

/// What `count` counts.
#[derive(Debug, Clone, PartialEq)]
pub enum CountTarget {
    /// `count(*)`
    All,
    /// `count(field)`: documents where the field is present
    Field(String),
}

/// Accumulator of a `$group` stage. Field operands carry their `$` prefix.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
    Count(CountTarget),
    /// Prebuilt accumulator document
    Custom(Bson),
}

impl Accumulator {
    fn new(function: AggregateFunction, field: String) -> Self {
        match function {
            AggregateFunction::Sum => Accumulator::Sum(field),
            AggregateFunction::Avg => Accumulator::Avg(field),
            AggregateFunction::Min => Accumulator::Min(field),
            AggregateFunction::Max => Accumulator::Max(field),
            AggregateFunction::Count if field == "$*" => Accumulator::Count(CountTarget::All),
            AggregateFunction::Count => Accumulator::Count(CountTarget::Field(field)),
        }
    }

    pub fn to_bson(&self) -> Bson {
        let (function, value) = match self {
            Accumulator::Sum(field) => (AggregateFunction::Sum, Bson::String(field.clone())),
            Accumulator::Avg(field) => (AggregateFunction::Avg, Bson::String(field.clone())),
            Accumulator::Min(field) => (AggregateFunction::Min, Bson::String(field.clone())),
            Accumulator::Max(field) => (AggregateFunction::Max, Bson::String(field.clone())),
            Accumulator::Count(CountTarget::All) => (AggregateFunction::Count, Bson::Int32(1)),
            Accumulator::Count(CountTarget::Field(field)) => (
                AggregateFunction::Count,
                Bson::Document(doc! {
                    "$cond": [{ "$ne": [{ "$type": field.as_str() }, "missing"] }, 1, 0]
                }),
            ),
            Accumulator::Custom(expression) => return expression.clone(),
        };

        single_key(function.mongo_operator(), value)
    }
}

/// Accumulators and projections contributed by the select-list functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectAggregation {
    /// Accumulators in registration order; keys are unique
    pub accumulators: Vec<(String, Accumulator)>,

    /// `$project` entries, keyed by alias or expression text
    pub projections: Document,
}

impl SelectAggregation {
    fn register(&mut self, key: String, accumulator: Accumulator) {
        if !self.accumulators.iter().any(|(existing, _)| *existing == key) {
            self.accumulators.push((key, accumulator));
        }
    }

    /// Accumulators rendered for a `$group` stage.
    pub fn group_fields(&self) -> Document {
        let mut fields = Document::new();
        for (key, accumulator) in &self.accumulators {
            fields.insert(key.clone(), accumulator.to_bson());
        }
        fields
    }
}

/// Flattens the function expressions of a select list.
///
/// Single aggregates are handled before arithmetic expressions; otherwise
/// the select-list order is kept.
pub fn flatten_select(functions: &[SelectExpression]) -> Result<SelectAggregation> {
    let (single, composite): (Vec<&SelectExpression>, Vec<&SelectExpression>) = functions
        .iter()
        .partition(|function| !is_math_expression(&function.expr));

    let mut aggregation = SelectAggregation::default();

    for expression in single.into_iter().chain(composite) {
        let name = expression
            .alias
            .clone()
            .unwrap_or_else(|| expression.expr.clone());

        match parse_expression(&expression.expr)? {
            ExprTree::Leaf(text) => {
                let function = expression
                    .function
                    .clone()
                    .unwrap_or_else(|| function_name(&text).to_string());
                let accumulator = accumulator_for(&function, &text)?;
                aggregation.register(expression.expr.clone(), accumulator);
                aggregation
                    .projections
                    .insert(name, format!("${}", expression.expr));
            }
            tree => {
                let projected = flatten_node(&tree, &mut aggregation)?;
                aggregation.projections.insert(name, projected);
            }
        }
    }

    Ok(aggregation)
}

/// Name of the function called in `text`: everything before the first `(`.
fn function_name(text: &str) -> &str {
    text.split_once('(')
        .map(|(name, _)| name)
        .unwrap_or(text)
        .trim()
}

/// Accumulator of a single call such as `sum(cost)` or `count(*)`.
fn accumulator_for(function: &str, text: &str) -> Result<Accumulator> {
    let aggregate = AggregateFunction::from_name(function)
        .ok_or_else(|| Error::NotSupportedAggregateFunction(function.to_ascii_lowercase()))?;

    let field = text
        .replacen(function, "", 1)
        .trim_matches(['(', ')', ' '])
        .to_string();
    if field.is_empty() {
        return Err(Error::MalformedExpression(format!(
            "{} has no argument",
            text.trim()
        )));
    }

    Ok(Accumulator::new(aggregate, format!("${}", field)))
}

/// Aggregation expression for an arithmetic tree, registering the
/// aggregates it reads.
fn flatten_node(node: &ExprTree, aggregation: &mut SelectAggregation) -> Result<Bson> {
    match node {
        ExprTree::Leaf(text) => {
            if let Some(number) = numeric_bson(text) {
                return Ok(number);
            }
            let accumulator = accumulator_for(function_name(text), text)?;
            aggregation.register(text.clone(), accumulator);
            Ok(Bson::String(format!("${}", text)))
        }
        ExprTree::Binary { op, left, right } => {
            let left = flatten_node(left, aggregation)?;
            let right = flatten_node(right, aggregation)?;
            Ok(single_key(op.mongo_operator(), Bson::Array(vec![left, right])))
        }
        ExprTree::Call { function, argument } => match AggregateFunction::from_name(function) {
            Some(AggregateFunction::Count) => {
                aggregation.register("count(*)".to_string(), Accumulator::Count(CountTarget::All));
                Ok(Bson::String("$count(*)".to_string()))
            }
            Some(_) => {
                let key = format!("{}{}", TMP_EXPRESSION_PREFIX, content_hash(node));
                let body = single_key(call_operator(function), field_refs(argument));
                aggregation.register(key.clone(), Accumulator::Custom(body));
                Ok(Bson::String(format!("${}", key)))
            }
            None => {
                let argument = flatten_node(argument, aggregation)?;
                Ok(single_key(call_operator(function), argument))
            }
        },
    }
}

/// Expression with numbers converted and every other leaf read as a field.
fn field_refs(node: &ExprTree) -> Bson {
    match node {
        ExprTree::Leaf(text) => {
            numeric_bson(text).unwrap_or_else(|| Bson::String(format!("${}", text)))
        }
        ExprTree::Binary { op, left, right } => single_key(
            op.mongo_operator(),
            Bson::Array(vec![field_refs(left), field_refs(right)]),
        ),
        ExprTree::Call { function, argument } => {
            single_key(call_operator(function), field_refs(argument))
        }
    }
}

fn call_operator(function: &str) -> String {
    format!("${}", function.to_ascii_lowercase())
}

fn single_key(key: impl Into<String>, value: Bson) -> Bson {
    let mut document = Document::new();
    document.insert(key, value);
    Bson::Document(document)
}

/// 64-bit FNV-1a of the JSON rendering of `node`, as 16 hex digits.
fn content_hash(node: &ExprTree) -> String {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = node
        .to_json()
        .to_string()
        .bytes()
        .fold(OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(PRIME)
        });

    format!("{:016x}", hash)
}
