//! Conversion of one comparison into a filter fragment.
//!
//! ```text
//! age > 12                       -> {age: {$gt: 12}}
//! 12 < age                       -> {age: {$gt: 12}}
//! name LIKE '^ndd'               -> {name: /^ndd/i}
//! role NOT IN ('a', 3)           -> {role: {$nin: ["a", 3]}}
//! created_at >= date('2020-12-12') -> {created_at: {$gte: ISODate(...)}}
//! ```
//!
//! String literals are replaced by placeholders while the comparison is split
//! into words, so operator characters inside literals are never mistaken for
//! comparators.

use bson::{Bson, Regex, doc};
use tracing::trace;

use crate::{
    ast::{ComparisonOp, QueryOperator},
    error::Result,
    filter::{Filter, Predicate},
    inline::InlineFunctionRegistry,
    value::{is_inline_function, scalar_bson, string_literal_value},
};

/// Comparators in matching order; longer spellings first.
const COMPARATORS: &[&str] = &["<=>", "<=", ">=", "<>", "!=", "<", ">", "="];

/// Literals swapped out of a comparison while it is split into words.
#[derive(Debug, Default)]
struct Shield {
    /// Placeholder and the quoted literal it stands for
    literals: Vec<(String, String)>,
}

impl Shield {
    /// Replaces every quoted occurrence of the identifiers in `text`.
    fn protect(identifiers: &[String], text: &str) -> (Shield, String) {
        let mut shield = Shield::default();
        let mut text = text.to_string();

        for identifier in identifiers.iter().filter(|identifier| !identifier.is_empty()) {
            for quote in ['\'', '"', '`'] {
                let literal = format!("{quote}{identifier}{quote}");
                if text.contains(&literal) {
                    let placeholder = format!("__literal_{}__", shield.literals.len());
                    text = text.replace(&literal, &placeholder);
                    shield.literals.push((placeholder, literal));
                }
            }
        }

        (shield, text)
    }

    fn restore(&self, text: &str) -> String {
        self.literals
            .iter()
            .fold(text.to_string(), |text, (placeholder, literal)| {
                text.replace(placeholder, literal)
            })
    }

    /// Restores `text` and lists the unquoted literals it contained.
    fn restore_collecting(&self, text: &str) -> (String, Vec<String>) {
        let mut restored = text.to_string();
        let mut contents = Vec::new();

        for (placeholder, literal) in &self.literals {
            if restored.contains(placeholder.as_str()) {
                contents.push(string_literal_value(literal).to_string());
                restored = restored.replace(placeholder, literal);
            }
        }

        (restored, contents)
    }
}

/// Puts spaces around comparators so that `a>=1` splits like `a >= 1`.
fn space_comparators(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len() + 8);
    let mut rest = text;

    'outer: while let Some(ch) = rest.chars().next() {
        for comparator in COMPARATORS {
            if let Some(after) = rest.strip_prefix(comparator) {
                spaced.push(' ');
                spaced.push_str(comparator);
                spaced.push(' ');
                rest = after;
                continue 'outer;
            }
        }
        spaced.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    spaced
}

/// Converts comparison texts into filter fragments, resolving inline
/// functions through a registry.
pub struct OperatorConverter<'a> {
    functions: &'a InlineFunctionRegistry,
}

impl<'a> OperatorConverter<'a> {
    pub fn new(functions: &'a InlineFunctionRegistry) -> Self {
        OperatorConverter { functions }
    }

    /// Converts `expr` given the literal identifiers the reader found in it.
    ///
    /// An unknown comparator yields an empty filter.
    pub fn convert(&self, identifiers: &[String], expr: &str) -> Result<Filter> {
        let (shield, protected) = Shield::protect(identifiers, expr);
        let words: Vec<String> = space_comparators(&protected)
            .split_whitespace()
            .map(str::to_owned)
            .collect();

        let filter = self.convert_words(identifiers, &shield, &words)?;
        trace!(expr, filter = ?filter.to_document(), "converted comparison");
        Ok(filter)
    }

    fn convert_words(
        &self,
        identifiers: &[String],
        shield: &Shield,
        words: &[String],
    ) -> Result<Filter> {
        let [field, operator, rest @ ..] = words else {
            return Ok(Filter::new());
        };

        let mut field = shield.restore(field);
        let mut operator = operator.to_ascii_lowercase();
        let mut rest = rest;
        let mut negated = false;

        if operator == "not"
            && let [next, tail @ ..] = rest
        {
            negated = true;
            operator = next.to_ascii_lowercase();
            rest = tail;
        } else if operator == "is"
            && let [next, tail @ ..] = rest
            && next.eq_ignore_ascii_case("not")
            && !tail.is_empty()
        {
            negated = true;
            rest = tail;
        }

        let Some(mut comparison) = ComparisonOp::parse(&operator) else {
            return Ok(Filter::new());
        };

        let protected_value = rest.join(" ");
        let mut value = shield.restore(&protected_value);

        if comparison != ComparisonOp::Between && is_reversed_operand(&field) {
            std::mem::swap(&mut field, &mut value);
            comparison = comparison.reversed();
        }

        let field = string_literal_value(&field).to_string();

        let predicate = match comparison {
            ComparisonOp::In => {
                let items = self.in_list(shield, &protected_value)?;
                let op = if negated {
                    QueryOperator::Nin
                } else {
                    QueryOperator::In
                };
                Predicate::operator(op, Bson::Array(items))
            }
            ComparisonOp::Between => {
                let Some((low, high)) = self.between(identifiers, &field, &value)? else {
                    return Ok(Filter::new());
                };
                if negated {
                    Predicate::operator(
                        QueryOperator::Not,
                        Bson::Document(doc! { "$gte": low, "$lte": high }),
                    )
                } else {
                    Predicate::Operators(vec![(QueryOperator::Gte, low), (QueryOperator::Lte, high)])
                }
            }
            _ => {
                let value = self.coerce(identifiers, &field, &value)?;
                match comparison {
                    ComparisonOp::Lt => Predicate::operator(QueryOperator::Lt, value),
                    ComparisonOp::Lte => Predicate::operator(QueryOperator::Lte, value),
                    ComparisonOp::Gt => Predicate::operator(QueryOperator::Gt, value),
                    ComparisonOp::Gte => Predicate::operator(QueryOperator::Gte, value),
                    ComparisonOp::NotEq => Predicate::operator(QueryOperator::Ne, value),
                    ComparisonOp::Eq => Predicate::Equals(value),
                    ComparisonOp::Is if negated => Predicate::operator(QueryOperator::Ne, value),
                    ComparisonOp::Is => Predicate::Equals(value),
                    ComparisonOp::Like => {
                        let pattern = match value {
                            Bson::String(pattern) => pattern,
                            other => other.to_string(),
                        };
                        if negated {
                            Predicate::operator(
                                QueryOperator::Not,
                                Bson::RegularExpression(Regex {
                                    pattern,
                                    options: "i".to_string(),
                                }),
                            )
                        } else {
                            Predicate::pattern(pattern)
                        }
                    }
                    ComparisonOp::In | ComparisonOp::Between => return Ok(Filter::new()),
                }
            }
        };

        Ok(Filter::field(field, predicate))
    }

    /// Coerces a value in comparison position.
    fn coerce(&self, identifiers: &[String], field: &str, value: &str) -> Result<Bson> {
        if let Some(scalar) = scalar_bson(value) {
            return Ok(scalar);
        }

        if is_inline_function(value) {
            // a field named like the function (`date = date('...')`) keeps
            // its identifier, which is also the function name
            let calls_field = value.starts_with(&format!("{}(", field));
            let arguments: Vec<&String> = identifiers
                .iter()
                .filter(|identifier| calls_field || identifier.as_str() != field)
                .collect();

            if let [name, payload, ..] = arguments.as_slice()
                && let Some(built) = self.functions.build(name, payload)?
            {
                return Ok(built);
            }
        }

        Ok(Bson::String(value.to_string()))
    }

    /// Items of an `IN (...)` list.
    fn in_list(&self, shield: &Shield, protected: &str) -> Result<Vec<Bson>> {
        let list = protected.trim();
        let list = list.strip_prefix('(').unwrap_or(list);
        let list = list.strip_suffix(')').unwrap_or(list);

        list.split(',')
            .map(|item| -> Result<Bson> {
                let (item, mut arguments) = shield.restore_collecting(item.trim());

                // `ObjectId('...')` only carries its payload; the name comes
                // from the item itself
                if arguments.len() == 1
                    && is_inline_function(&item)
                    && let Some(open) = item.find('(')
                {
                    arguments.insert(0, item[..open].trim().to_string());
                }

                if let Some(scalar) = scalar_bson(&item) {
                    return Ok(scalar);
                }

                if let [name, payload, ..] = arguments.as_slice()
                    && let Some(built) = self.functions.build(name, payload)?
                {
                    return Ok(built);
                }

                Ok(Bson::String(item))
            })
            .collect()
    }

    /// Bounds of `BETWEEN low AND high`.
    fn between(
        &self,
        identifiers: &[String],
        field: &str,
        value: &str,
    ) -> Result<Option<(Bson, Bson)>> {
        let words: Vec<&str> = value.split_whitespace().collect();
        let Some(split) = words.iter().position(|word| word.eq_ignore_ascii_case("and")) else {
            return Ok(None);
        };

        let low = self.coerce(identifiers, field, &words[..split].join(" "))?;
        let high = self.coerce(identifiers, field, &words[split + 1..].join(" "))?;

        Ok(Some((low, high)))
    }
}

/// A left operand that is a literal means the comparison is written
/// backwards: `12 < age`, `'x' = name`, `date('...') < created_at`.
fn is_reversed_operand(operand: &str) -> bool {
    crate::value::is_numeric(operand)
        || operand.starts_with(['\'', '"'])
        || is_inline_function(operand)
}
