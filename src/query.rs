//! Translation results.
//!
//! A SELECT without grouping becomes a [`FindQuery`]: a filter plus the
//! options a driver's `find` takes. Anything with GROUP BY or aggregate
//! functions becomes an [`Aggregate`] pipeline.

use bson::{Bson, Document, doc};

use crate::filter::Filter;

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Find(FindQuery),
    Aggregate(Aggregate),
}

impl Query {
    /// Target collection.
    pub fn collection(&self) -> &str {
        match self {
            Query::Find(find) => &find.collection,
            Query::Aggregate(aggregate) => &aggregate.collection,
        }
    }

    /// Index named by the first index hint of the statement.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Query::Find(find) => find.hint.as_deref(),
            Query::Aggregate(aggregate) => aggregate.hint.as_deref(),
        }
    }

    /// `"find"` or `"aggregate"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Query::Find(_) => "find",
            Query::Aggregate(_) => "aggregate",
        }
    }

    pub fn as_find(&self) -> Option<&FindQuery> {
        match self {
            Query::Find(find) => Some(find),
            Query::Aggregate(_) => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        match self {
            Query::Aggregate(aggregate) => Some(aggregate),
            Query::Find(_) => None,
        }
    }
}

/// Filtered query over one collection.
///
/// A `limit` or `skip` of zero means the statement did not set it.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub collection: String,
    pub filter: Filter,
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub limit: u64,
    pub skip: u64,
    pub hint: Option<String>,
}

impl FindQuery {
    pub fn filter_document(&self) -> Document {
        self.filter.to_document()
    }

    /// Options view for a driver's `find`; a zero skip or limit is absent.
    pub fn options(&self) -> FindOptions {
        FindOptions {
            skip: (self.skip > 0).then_some(self.skip),
            limit: (self.limit > 0).then_some(self.limit),
            projection: self.projection.clone(),
            sort: self.sort.clone(),
            hint: self.hint.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub hint: Option<String>,
}

impl FindOptions {
    /// Options as a document, absent entries rendered as `null`.
    pub fn to_document(&self) -> Document {
        let optional_document = |value: &Option<Document>| {
            value.clone().map(Bson::Document).unwrap_or(Bson::Null)
        };

        doc! {
            "skip": self.skip.map(integer_bson).unwrap_or(Bson::Null),
            "limit": self.limit.map(integer_bson).unwrap_or(Bson::Null),
            "projection": optional_document(&self.projection),
            "sort": optional_document(&self.sort),
            "hint": self.hint.clone().map(Bson::String).unwrap_or(Bson::Null),
        }
    }
}

/// One stage of an aggregation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Document),
    Group(Document),
    Project(Document),
    Sort(Document),
    Skip(u64),
    Limit(u64),
}

impl Stage {
    /// Stage operator, e.g. `$group`.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "$match",
            Stage::Group(_) => "$group",
            Stage::Project(_) => "$project",
            Stage::Sort(_) => "$sort",
            Stage::Skip(_) => "$skip",
            Stage::Limit(_) => "$limit",
        }
    }

    pub fn to_document(&self) -> Document {
        let value = match self {
            Stage::Match(body) | Stage::Group(body) | Stage::Project(body) | Stage::Sort(body) => {
                Bson::Document(body.clone())
            }
            Stage::Skip(count) | Stage::Limit(count) => integer_bson(*count),
        };

        let mut document = Document::new();
        document.insert(self.name(), value);
        document
    }
}

/// Aggregation pipeline over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub collection: String,
    pub pipeline: Vec<Stage>,
    pub hint: Option<String>,
}

impl Aggregate {
    pub fn pipeline_documents(&self) -> Vec<Document> {
        self.pipeline.iter().map(Stage::to_document).collect()
    }

    /// First stage with the given operator name.
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.pipeline.iter().find(|stage| stage.name() == name)
    }
}

fn integer_bson(value: u64) -> Bson {
    match i32::try_from(value) {
        Ok(small) => Bson::Int32(small),
        Err(_) => Bson::Int64(i64::try_from(value).unwrap_or(i64::MAX)),
    }
}
