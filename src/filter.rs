//! Typed query filters.
//!
//! A [`Filter`] is an ordered map from keys to clauses, rendered as a BSON
//! query document. Keys are field names or the connectives `$and` / `$or`;
//! each key appears at most once.
//!
//! Filters are combined with [`Filter::and`] and [`Filter::or`], which keep
//! the rendered document flat:
//!
//! ```text
//! {created_at: {$lte: X}}  and  {created_at: {$gte: Y}}  ->  {created_at: {$lte: X, $gte: Y}}
//! {$or: [A, B]}            or   {$or: [C, D]}            ->  {$or: [A, B, C, D]}
//! ```

use bson::{Bson, Document, Regex};

use crate::ast::QueryOperator;

/// Condition placed on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `{field: value}`
    Equals(Bson),

    /// `{field: /pattern/options}`
    Pattern(Regex),

    /// `{field: {$gt: .., $lte: ..}}`
    Operators(Vec<(QueryOperator, Bson)>),
}

impl Predicate {
    pub fn operator(op: QueryOperator, value: Bson) -> Self {
        Predicate::Operators(vec![(op, value)])
    }

    /// Case-insensitive pattern match.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Predicate::Pattern(Regex {
            pattern: pattern.into(),
            options: "i".to_string(),
        })
    }

    fn to_bson(&self) -> Bson {
        match self {
            Predicate::Equals(value) => value.clone(),
            Predicate::Pattern(regex) => Bson::RegularExpression(regex.clone()),
            Predicate::Operators(operators) => {
                let mut document = Document::new();
                for (op, value) in operators {
                    document.insert(op.as_str(), value.clone());
                }
                Bson::Document(document)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Field { name: String, predicate: Predicate },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Clause {
    /// Key of the clause in the rendered document.
    pub fn key(&self) -> &str {
        match self {
            Clause::Field { name, .. } => name,
            Clause::And(_) => "$and",
            Clause::Or(_) => "$or",
        }
    }

    fn value(&self) -> Bson {
        match self {
            Clause::Field { predicate, .. } => predicate.to_bson(),
            Clause::And(filters) | Clause::Or(filters) => Bson::Array(
                filters
                    .iter()
                    .map(|filter| Bson::Document(filter.to_document()))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    /// Filter with a single field clause.
    pub fn field(name: impl Into<String>, predicate: Predicate) -> Self {
        Filter {
            clauses: vec![Clause::Field {
                name: name.into(),
                predicate,
            }],
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.clauses.iter().position(|clause| clause.key() == key)
    }

    fn into_only_and(self) -> Result<Vec<Filter>, Filter> {
        match <[Clause; 1]>::try_from(self.clauses) {
            Ok([Clause::And(filters)]) => Ok(filters),
            Ok([clause]) => Err(Filter {
                clauses: vec![clause],
            }),
            Err(clauses) => Err(Filter { clauses }),
        }
    }

    fn into_only_or(self) -> Result<Vec<Filter>, Filter> {
        match <[Clause; 1]>::try_from(self.clauses) {
            Ok([Clause::Or(filters)]) => Ok(filters),
            Ok([clause]) => Err(Filter {
                clauses: vec![clause],
            }),
            Err(clauses) => Err(Filter { clauses }),
        }
    }

    /// Returns true when the filter is a bare `{$or: [...]}`.
    pub fn is_only_or(&self) -> bool {
        matches!(self.clauses.as_slice(), [Clause::Or(_)])
    }

    /// Conjunction of `self` and `sub`.
    ///
    /// - an empty side yields the other side
    /// - an existing `$and` absorbs `sub` (splicing a bare `$and`)
    /// - filters on disjoint keys are united
    /// - two operator predicates on the one shared field are merged when
    ///   their operators differ and one side has no other key
    /// - anything else becomes `{$and: [self, sub]}`
    pub fn and(mut self, sub: Filter) -> Filter {
        if self.is_empty() {
            return sub;
        }

        if let Some(index) = self.position("$and") {
            if let Clause::And(filters) = &mut self.clauses[index] {
                match sub.into_only_and() {
                    Ok(spliced) => filters.extend(spliced),
                    Err(sub) => filters.push(sub),
                }
            }
            return self;
        }

        let shared: Vec<usize> = self
            .clauses
            .iter()
            .enumerate()
            .filter(|(_, clause)| sub.position(clause.key()).is_some())
            .map(|(index, _)| index)
            .collect();

        if shared.is_empty() {
            self.clauses.extend(sub.clauses);
            return self;
        }

        if let &[index] = shared.as_slice() {
            let key = self.clauses[index].key().to_string();
            if let Some(sub_index) = sub.position(&key)
                && mergeable(&self.clauses[index], &sub.clauses[sub_index])
            {
                if sub.len() == 1 {
                    merge_operators(&mut self.clauses[index], &sub.clauses[sub_index]);
                    return self;
                }
                if self.len() == 1 {
                    let mut sub = sub;
                    merge_operators(&mut sub.clauses[sub_index], &self.clauses[index]);
                    return sub;
                }
            }
        }

        Filter {
            clauses: vec![Clause::And(vec![self, sub])],
        }
    }

    /// Disjunction of `self` and `sub`, splicing bare `$or` filters on either
    /// side instead of nesting them. An empty side yields the other side.
    pub fn or(self, sub: Filter) -> Filter {
        if self.is_empty() {
            return sub;
        }
        if sub.is_empty() {
            return self;
        }

        let sub_is_or = sub.is_only_or();

        let filters = match self.into_only_or() {
            Ok(mut filters) => {
                match sub.into_only_or() {
                    Ok(spliced) => filters.extend(spliced),
                    Err(sub) => filters.push(sub),
                }
                filters
            }
            Err(this) if sub_is_or => {
                let mut filters = vec![this];
                if let Ok(spliced) = sub.into_only_or() {
                    filters.extend(spliced);
                }
                filters
            }
            Err(this) => vec![this, sub],
        };

        Filter {
            clauses: vec![Clause::Or(filters)],
        }
    }

    /// Renders the filter as a BSON query document.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        for clause in &self.clauses {
            document.insert(clause.key(), clause.value());
        }
        document
    }
}

impl From<&Filter> for Document {
    fn from(filter: &Filter) -> Self {
        filter.to_document()
    }
}

fn mergeable(existing: &Clause, incoming: &Clause) -> bool {
    match (existing, incoming) {
        (
            Clause::Field {
                predicate: Predicate::Operators(left),
                ..
            },
            Clause::Field {
                predicate: Predicate::Operators(right),
                ..
            },
        ) => left
            .iter()
            .all(|(op, _)| right.iter().all(|(other, _)| op != other)),
        _ => false,
    }
}

fn merge_operators(target: &mut Clause, source: &Clause) {
    if let (
        Clause::Field {
            predicate: Predicate::Operators(target),
            ..
        },
        Clause::Field {
            predicate: Predicate::Operators(source),
            ..
        },
    ) = (target, source)
    {
        target.extend(source.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn gte(field: &str, value: i32) -> Filter {
        Filter::field(field, Predicate::operator(QueryOperator::Gte, Bson::Int32(value)))
    }

    fn lte(field: &str, value: i32) -> Filter {
        Filter::field(field, Predicate::operator(QueryOperator::Lte, Bson::Int32(value)))
    }

    fn eq(field: &str, value: i32) -> Filter {
        Filter::field(field, Predicate::Equals(Bson::Int32(value)))
    }

    #[test]
    fn test_and_with_empty() {
        assert_eq!(Filter::new().and(eq("a", 1)), eq("a", 1));
        assert_eq!(eq("a", 1).and(Filter::new()).to_document(), doc! { "a": 1 });
    }

    #[test]
    fn test_or_with_empty() {
        assert_eq!(Filter::new().or(eq("a", 1)), eq("a", 1));
        assert_eq!(eq("a", 1).or(Filter::new()), eq("a", 1));
    }

    #[test]
    fn test_and_collapses_range() {
        let filter = gte("age", 12).and(lte("age", 60));
        assert_eq!(filter.to_document(), doc! { "age": { "$gte": 12, "$lte": 60 } });
    }

    #[test]
    fn test_and_same_operator_nests() {
        let filter = gte("age", 12).and(gte("age", 20));
        assert_eq!(
            filter.to_document(),
            doc! { "$and": [{ "age": { "$gte": 12 } }, { "age": { "$gte": 20 } }] }
        );
    }

    #[test]
    fn test_and_equality_on_same_field_nests() {
        let filter = eq("a", 1).and(eq("a", 2));
        assert_eq!(filter.to_document(), doc! { "$and": [{ "a": 1 }, { "a": 2 }] });
    }

    #[test]
    fn test_and_merges_into_wider_sub_filter() {
        let sub = eq("status", 1).and(gte("created_at", 5));
        let filter = lte("created_at", 9).and(sub);
        assert_eq!(
            filter.to_document(),
            doc! { "status": 1, "created_at": { "$gte": 5, "$lte": 9 } }
        );
    }

    #[test]
    fn test_and_appends_to_existing_and() {
        let filter = eq("a", 1).and(eq("a", 2)).and(eq("b", 3));
        assert_eq!(
            filter.to_document(),
            doc! { "$and": [{ "a": 1 }, { "a": 2 }, { "b": 3 }] }
        );
    }

    #[test]
    fn test_or_flattens_both_sides() {
        let left = eq("a", 1).or(eq("a", 2));
        let right = eq("a", 3).or(eq("a", 4));
        assert_eq!(
            left.or(right).to_document(),
            doc! { "$or": [{ "a": 1 }, { "a": 2 }, { "a": 3 }, { "a": 4 }] }
        );
    }

    #[test]
    fn test_or_splices_right_side() {
        let right = eq("b", 2).or(eq("c", 3));
        assert_eq!(
            eq("a", 1).or(right).to_document(),
            doc! { "$or": [{ "a": 1 }, { "b": 2 }, { "c": 3 }] }
        );
    }
}
