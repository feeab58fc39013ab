//! SELECT statement → find query or aggregation pipeline.
//!
//! ```text
//! SELECT id, name FROM users WHERE age > 12 ORDER BY id DESC LIMIT 5, 10
//!     -> find users {age: {$gt: 12}}
//!        projection {id: 1, name: 1}, sort {id: -1}, skip 5, limit 10
//!
//! SELECT user_id, sum(cost) AS total FROM logs GROUP BY user_id HAVING total > 10
//!     -> aggregate logs
//!        $match {}
//!        $group {_id: {user_id: "$user_id"}, "sum(cost)": {$sum: "$cost"}}
//!        $project {user_id: "$_id.user_id", total: "$sum(cost)", _id: 0}
//!        $match {total: {$gt: 10}}
//! ```

use bson::{Bson, Document};
use tracing::debug;

use crate::{
    aggregate::flatten_select,
    ast::{SelectExpression, SelectStatement, SortDirection, Statement},
    condition::ConditionReducer,
    error::{Error, Result},
    inline::{BuilderError, InlineFunctionRegistry},
    parser::parse_statement,
    query::{Aggregate, FindQuery, Query, Stage},
    value::string_literal_value,
};

/// Separator replacing `.` in group-by keys, which must be flat.
const GROUP_KEY_SEPARATOR: &str = "__";

/// SQL to MongoDB translator.
///
/// Holds the inline-function builders used for values such as
/// `date('2020-12-12')`; everything else is stateless.
///
/// # Examples
///
/// ```
/// use bson::doc;
/// use sql_to_mongodb_query::{Query, SqlToMongo};
///
/// let translator = SqlToMongo::new();
/// let query = translator
///     .parse("SELECT * FROM users WHERE age > 12")
///     .unwrap()
///     .unwrap();
///
/// let Query::Find(find) = query else { panic!("expected a find query") };
/// assert_eq!(find.collection, "users");
/// assert_eq!(find.filter_document(), doc! { "age": { "$gt": 12 } });
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlToMongo {
    inline_functions: InlineFunctionRegistry,
}

impl SqlToMongo {
    /// Translator with the default `date`, `ObjectId` and `Id` builders.
    pub fn new() -> Self {
        SqlToMongo::default()
    }

    pub fn with_inline_functions(inline_functions: InlineFunctionRegistry) -> Self {
        SqlToMongo { inline_functions }
    }

    pub fn inline_functions(&self) -> &InlineFunctionRegistry {
        &self.inline_functions
    }

    /// Registers a builder, replacing any builder with the same name.
    pub fn add_inline_function_builder<F>(&mut self, name: impl Into<String>, builder: F) -> &mut Self
    where
        F: Fn(&str) -> std::result::Result<Bson, BuilderError> + Send + Sync + 'static,
    {
        self.inline_functions.register(name, builder);
        self
    }

    /// Removes a builder. Returns whether one was registered.
    pub fn remove_inline_function_builder(&mut self, name: &str) -> bool {
        self.inline_functions.remove(name)
    }

    /// Reads `sql` and translates it.
    ///
    /// Returns `Ok(None)` for a SELECT without a FROM table.
    pub fn parse(&self, sql: &str) -> Result<Option<Query>> {
        let statement = parse_statement(sql)
            .map_err(|e| Error::InvalidQuery(format!("{} ({})", sql, e)))?
            .ok_or_else(|| Error::InvalidQuery(sql.to_string()))?;

        self.translate_statement(&statement)
    }

    /// Translates a statement read by any parser.
    pub fn translate_statement(&self, statement: &Statement) -> Result<Option<Query>> {
        match statement {
            Statement::Select(select) => self.translate_select(select),
            Statement::Other { kind } => Err(Error::NotSupportedStatement(kind.clone())),
        }
    }

    fn translate_select(&self, statement: &SelectStatement) -> Result<Option<Query>> {
        let Some(from) = statement.from.first() else {
            debug!("select statement without a table, nothing to translate");
            return Ok(None);
        };
        let collection = from.table.clone();

        let reducer = ConditionReducer::new(&self.inline_functions);
        let filter = reducer.reduce(&statement.where_conditions)?;

        let (fields, functions) = partition_select(&statement.expr)?;
        let sort = sort_document(statement);
        let (skip, limit) = statement
            .limit
            .map(|limit| (limit.offset, limit.row_count))
            .unwrap_or((0, 0));
        let hint = statement
            .index_hints
            .first()
            .and_then(|hint| hint.indexes.first())
            .cloned();

        if statement.group.is_empty() && functions.is_empty() {
            if !statement.having.is_empty() {
                return Err(Error::InvalidSelectStatement(
                    "Cannot use having without group by".to_string(),
                ));
            }

            let projection = (!fields.is_empty()).then(|| {
                let mut projection = Document::new();
                for field in &fields {
                    projection.insert(field.clone(), 1);
                }
                projection
            });

            debug!(%collection, kind = "find", filter = ?filter.to_document(), "translated select statement");

            return Ok(Some(Query::Find(FindQuery {
                collection,
                filter,
                projection,
                sort,
                limit,
                skip,
                hint,
            })));
        }

        let group_keys = group_keys(statement);
        validate_fields(&fields, &group_keys)?;

        let aggregation = flatten_select(&functions)?;
        let mut pipeline = vec![Stage::Match(filter.to_document())];

        let mut group = Document::new();
        group.insert("_id", group_id(&group_keys));
        for (key, value) in aggregation.group_fields() {
            group.insert(key, value);
        }
        pipeline.push(Stage::Group(group));

        let mut project = Document::new();
        for field in &fields {
            project.insert(field.clone(), format!("$_id.{}", group_key(field)));
        }
        for (key, value) in aggregation.projections {
            project.insert(key, value);
        }
        if !project.is_empty() {
            if !project.contains_key("_id") {
                project.insert("_id", 0);
            }
            pipeline.push(Stage::Project(project));
        }

        let having = reducer.reduce(&statement.having)?;
        if !having.is_empty() {
            pipeline.push(Stage::Match(having.to_document()));
        }
        if let Some(sort) = sort {
            pipeline.push(Stage::Sort(sort));
        }
        if skip > 0 {
            pipeline.push(Stage::Skip(skip));
        }
        if limit > 0 {
            pipeline.push(Stage::Limit(limit));
        }

        debug!(%collection, kind = "aggregate", stages = pipeline.len(), "translated select statement");

        Ok(Some(Query::Aggregate(Aggregate {
            collection,
            pipeline,
            hint,
        })))
    }
}

/// Splits the select list into projected field names and function items.
fn partition_select(items: &[SelectExpression]) -> Result<(Vec<String>, Vec<SelectExpression>)> {
    if items.is_empty() {
        return Err(Error::InvalidSelectStatement(
            "Invalid SELECT statement".to_string(),
        ));
    }

    let mut fields = Vec::new();
    let mut functions = Vec::new();

    for item in items {
        if item.function.is_some() {
            functions.push(item.clone());
            continue;
        }
        let field = string_literal_value(item.expr.trim());
        if field != "*" {
            fields.push(field.to_string());
        }
    }

    Ok((fields, functions))
}

fn sort_document(statement: &SelectStatement) -> Option<Document> {
    if statement.order.is_empty() {
        return None;
    }

    let mut sort = Document::new();
    for item in &statement.order {
        let direction = match item.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        };
        sort.insert(item.expr.clone(), direction);
    }
    Some(sort)
}

fn group_key(field: &str) -> String {
    field.replace('.', GROUP_KEY_SEPARATOR)
}

/// Group-by keys and the field each one reads.
fn group_keys(statement: &SelectStatement) -> Vec<(String, String)> {
    statement
        .group
        .iter()
        .map(|item| {
            let field = string_literal_value(item.expr.trim());
            (group_key(field), format!("${}", field))
        })
        .collect()
}

fn group_id(keys: &[(String, String)]) -> Bson {
    if keys.is_empty() {
        return Bson::Null;
    }

    let mut id = Document::new();
    for (key, field) in keys {
        id.insert(key.clone(), field.clone());
    }
    Bson::Document(id)
}

/// Every projected field, `_id` aside, must be a group-by key.
fn validate_fields(fields: &[String], keys: &[(String, String)]) -> Result<()> {
    let invalid: Vec<String> = fields
        .iter()
        .filter(|field| field.as_str() != "_id")
        .filter(|field| {
            let key = group_key(field);
            !keys.iter().any(|(existing, _)| *existing == key)
        })
        .cloned()
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidSelectField(invalid))
    }
}

impl From<FindQuery> for Query {
    fn from(find: FindQuery) -> Self {
        Query::Find(find)
    }
}

impl From<Aggregate> for Query {
    fn from(aggregate: Aggregate) -> Self {
        Query::Aggregate(aggregate)
    }
}

/// Translates `sql` with the default inline-function builders.
pub fn translate(sql: &str) -> Result<Option<Query>> {
    SqlToMongo::new().parse(sql)
}
