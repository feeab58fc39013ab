//! Reduction of flat WHERE / HAVING condition lists.
//!
//! The reader keeps conditions as a flat list of leaves and connectives; the
//! parentheses of a group stay in the texts of its first and last leaf. The
//! reducer walks the list once and rebuilds the boolean structure:
//!
//! - `OR` takes everything up to the next top-level `OR` as its right side,
//!   so `AND` binds tighter
//! - a leaf that opens brackets starts a group running to the leaf that
//!   closes them; the group is reduced on its own
//! - any other leaf is converted with the [`OperatorConverter`]
//!
//! ```text
//! a = 1 | OR | (b = 2 | AND | c = 3)  ->  {$or: [{a: 1}, {b: 2, c: 3}]}
//! ```

use tracing::trace;

use crate::{
    ast::Condition,
    error::Result,
    filter::Filter,
    inline::InlineFunctionRegistry,
    operator::OperatorConverter,
};

pub struct ConditionReducer<'a> {
    converter: OperatorConverter<'a>,
}

impl<'a> ConditionReducer<'a> {
    pub fn new(functions: &'a InlineFunctionRegistry) -> Self {
        ConditionReducer {
            converter: OperatorConverter::new(functions),
        }
    }

    /// Reduces a condition list to a single filter.
    pub fn reduce(&self, conditions: &[Condition]) -> Result<Filter> {
        let filter = self.reduce_list(conditions)?;
        trace!(
            conditions = conditions.len(),
            filter = ?filter.to_document(),
            "reduced condition list"
        );
        Ok(filter)
    }

    fn reduce_list(&self, conditions: &[Condition]) -> Result<Filter> {
        let mut filter = Filter::new();
        let mut index = 0;

        while index < conditions.len() {
            let condition = &conditions[index];

            if condition.is_operator {
                if condition.is_or() {
                    let end = or_operand_end(conditions, index + 1);
                    let sub = self.reduce_list(&conditions[index + 1..end])?;
                    filter = filter.or(sub);
                    index = end;
                } else {
                    index += 1;
                }
                continue;
            }

            let depth = condition.bracket_depth();

            if depth <= 0 {
                let mut text = strip_wrapping_brackets(condition.expr.trim());
                for _ in depth..0 {
                    text = text.strip_suffix(')').unwrap_or(text).trim_end();
                }
                let fragment = self.converter.convert(&condition.identifiers, text)?;
                filter = filter.and(fragment);
                index += 1;
                continue;
            }

            let (group, end) = bracket_group(conditions, index, depth);
            let sub = self.reduce_list(&group)?;
            filter = filter.and(sub);
            index = end;
        }

        Ok(filter)
    }
}

/// Index of the next top-level `OR` at or after `start`, or the list end.
fn or_operand_end(conditions: &[Condition], start: usize) -> usize {
    let mut depth = 0;

    for (offset, node) in conditions[start..].iter().enumerate() {
        if node.is_operator {
            if node.is_or() && depth == 0 {
                return start + offset;
            }
        } else {
            depth += node.bracket_depth();
        }
    }

    conditions.len()
}

/// Collects the group opened by `conditions[start]`, without its outer
/// brackets. Returns the group and the index after it.
fn bracket_group(conditions: &[Condition], start: usize, depth: i32) -> (Vec<Condition>, usize) {
    let first = &conditions[start];
    let mut group = vec![Condition {
        expr: strip_open(&first.expr),
        ..first.clone()
    }];
    let mut depth = depth;
    let mut index = start + 1;

    while index < conditions.len() {
        let node = &conditions[index];
        depth += node.bracket_depth();
        index += 1;

        if !node.is_operator && depth == 0 {
            group.push(Condition {
                expr: strip_close(&node.expr),
                ..node.clone()
            });
            break;
        }
        group.push(node.clone());
    }

    (group, index)
}

fn strip_open(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix('(').unwrap_or(text).to_string()
}

fn strip_close(text: &str) -> String {
    let text = text.trim();
    text.strip_suffix(')').unwrap_or(text).to_string()
}

/// Removes brackets that enclose the whole text: `((a = 1))` → `a = 1`.
fn strip_wrapping_brackets(mut text: &str) -> &str {
    while text.starts_with('(') && text.ends_with(')') && encloses_all(text) {
        text = text[1..text.len() - 1].trim();
    }
    text
}

/// Returns true when the bracket opened by the first character closes at the
/// last one. Brackets inside quotes do not count.
fn encloses_all(text: &str) -> bool {
    let last = text.len() - 1;
    let mut depth = 0;
    let mut quote = None;

    for (position, ch) in text.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 && position != last {
                        return false;
                    }
                }
                _ => {}
            },
        }
    }

    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn leaf(expr: &str, identifiers: &[&str]) -> Condition {
        Condition::leaf(expr, identifiers.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_strip_wrapping_brackets() {
        assert_eq!(strip_wrapping_brackets("((a = 1))"), "a = 1");
        assert_eq!(strip_wrapping_brackets("(a) = (b)"), "(a) = (b)");
        assert_eq!(strip_wrapping_brackets("(a = ')')"), "a = ')'");
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let registry = InlineFunctionRegistry::default();
        let conditions = vec![
            leaf("a = 1", &["a"]),
            Condition::connective("or"),
            leaf("b = 2", &["b"]),
            Condition::connective("and"),
            leaf("c = 3", &["c"]),
        ];
        let filter = ConditionReducer::new(&registry).reduce(&conditions).unwrap();
        assert_eq!(
            filter.to_document(),
            doc! { "$or": [{ "a": 1 }, { "b": 2, "c": 3 }] }
        );
    }

    #[test]
    fn test_group_spanning_nodes() {
        let registry = InlineFunctionRegistry::default();
        let conditions = vec![
            leaf("(a = 1", &["a"]),
            Condition::connective("or"),
            leaf("a = 2)", &["a"]),
            Condition::connective("and"),
            leaf("b = 3", &["b"]),
        ];
        let filter = ConditionReducer::new(&registry).reduce(&conditions).unwrap();
        assert_eq!(
            filter.to_document(),
            doc! { "$or": [{ "a": 1 }, { "a": 2 }], "b": 3 }
        );
    }
}
