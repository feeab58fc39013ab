// tests/aggregate_tests.rs

use bson::{Bson, DateTime, doc};
use indoc::indoc;
use sql_to_mongodb_query::aggregate::{
    Accumulator, CountTarget, TMP_EXPRESSION_PREFIX, flatten_select,
};
use sql_to_mongodb_query::ast::SelectExpression;
use sql_to_mongodb_query::{Aggregate, Error, Query, SqlToMongo, Stage};

fn aggregate(sql: &str) -> Aggregate {
    match SqlToMongo::new().parse(sql).unwrap() {
        Some(Query::Aggregate(aggregate)) => aggregate,
        other => panic!("Expected an aggregate query, got {:?}", other),
    }
}

// ============================================================================
// Pipelines
// ============================================================================

#[test]
fn test_group_by_pipeline() {
    let aggregate = aggregate(indoc! {r#"
        SELECT user_id, count(*), sum(time)
        FROM logs
        use index index_name
        where created_at >= date("2020-12-12")
        group by user_id
        order by count(*) desc
        limit 20, 10
        having count(*) > 2 and sum(time) > 1000
    "#});

    assert_eq!(aggregate.collection, "logs");
    assert_eq!(aggregate.hint.as_deref(), Some("index_name"));
    assert_eq!(aggregate.pipeline.len(), 7);

    assert_eq!(
        aggregate.pipeline_documents(),
        vec![
            doc! { "$match": { "created_at": { "$gte": DateTime::from_millis(1_607_731_200_000) } } },
            doc! { "$group": {
                "_id": { "user_id": "$user_id" },
                "count(*)": { "$sum": 1 },
                "sum(time)": { "$sum": "$time" },
            } },
            doc! { "$project": {
                "user_id": "$_id.user_id",
                "count(*)": "$count(*)",
                "sum(time)": "$sum(time)",
                "_id": 0,
            } },
            doc! { "$match": { "count(*)": { "$gt": 2 }, "sum(time)": { "$gt": 1000 } } },
            doc! { "$sort": { "count(*)": -1 } },
            doc! { "$skip": 20 },
            doc! { "$limit": 10 },
        ]
    );
}

#[test]
fn test_group_by_without_functions() {
    let aggregate = aggregate(indoc! {r#"
        SELECT user_id
        FROM logs
        where created_at >= date("2020-12-12")
        group by user_id
    "#});

    assert_eq!(aggregate.collection, "logs");
    assert_eq!(aggregate.pipeline.len(), 3);
    assert_eq!(
        aggregate.pipeline[1],
        Stage::Group(doc! { "_id": { "user_id": "$user_id" } })
    );
    assert_eq!(
        aggregate.pipeline[2],
        Stage::Project(doc! { "user_id": "$_id.user_id", "_id": 0 })
    );
}

#[test]
fn test_empty_match_is_kept() {
    let aggregate = aggregate("SELECT user_id FROM logs GROUP BY user_id");
    assert_eq!(aggregate.pipeline_documents()[0], doc! { "$match": {} });
}

#[test]
fn test_functions_without_group_by() {
    let aggregate = aggregate("SELECT count(*), sum(x) FROM t");
    assert_eq!(
        aggregate.pipeline[1],
        Stage::Group(doc! {
            "_id": null,
            "count(*)": { "$sum": 1 },
            "sum(x)": { "$sum": "$x" },
        })
    );
}

#[test]
fn test_group_by_nested_field() {
    let aggregate = aggregate("SELECT device.type, count(*) AS total FROM clicks GROUP BY device.type");
    assert_eq!(
        aggregate.pipeline_documents()[1..3].to_vec(),
        vec![
            doc! { "$group": {
                "_id": { "device__type": "$device.type" },
                "count(*)": { "$sum": 1 },
            } },
            doc! { "$project": {
                "device.type": "$_id.device__type",
                "total": "$count(*)",
                "_id": 0,
            } },
        ]
    );
}

#[test]
fn test_having_uses_aliases() {
    let aggregate = aggregate(
        "SELECT user_id, sum(cost) AS total FROM logs GROUP BY user_id HAVING total > 10",
    );
    assert_eq!(aggregate.stage("$project"), Some(&Stage::Project(doc! {
        "user_id": "$_id.user_id",
        "total": "$sum(cost)",
        "_id": 0,
    })));
    assert_eq!(aggregate.pipeline[3], Stage::Match(doc! { "total": { "$gt": 10 } }));
}

#[test]
fn test_selected_id_is_not_suppressed() {
    let aggregate = aggregate("SELECT _id, count(*) FROM logs GROUP BY user_id");
    assert_eq!(
        aggregate.stage("$project"),
        Some(&Stage::Project(doc! { "_id": "$_id._id", "count(*)": "$count(*)" }))
    );
}

#[test]
fn test_all_aggregate_functions() {
    let aggregate = aggregate(
        "SELECT SUM(a), avg(b), min(c), max(d), count(e) FROM t",
    );
    assert_eq!(
        aggregate.pipeline[1],
        Stage::Group(doc! {
            "_id": null,
            "SUM(a)": { "$sum": "$a" },
            "avg(b)": { "$avg": "$b" },
            "min(c)": { "$min": "$c" },
            "max(d)": { "$max": "$d" },
            "count(e)": { "$sum": { "$cond": [{ "$ne": [{ "$type": "$e" }, "missing"] }, 1, 0] } },
        })
    );
}

// ============================================================================
// Composite expressions
// ============================================================================

#[test]
fn test_composite_expression() {
    let aggregate = aggregate("SELECT user_id, sum(cost) / count(*) AS cpc FROM logs GROUP BY user_id");
    assert_eq!(
        aggregate.pipeline[1],
        Stage::Group(doc! {
            "_id": { "user_id": "$user_id" },
            "sum(cost)": { "$sum": "$cost" },
            "count(*)": { "$sum": 1 },
        })
    );
    assert_eq!(
        aggregate.pipeline[2],
        Stage::Project(doc! {
            "user_id": "$_id.user_id",
            "cpc": { "$divide": ["$sum(cost)", "$count(*)"] },
            "_id": 0,
        })
    );
}

#[test]
fn test_composite_with_numbers() {
    let aggregate = aggregate("SELECT sum(cost) / 1000 * 2.5 AS k FROM logs");
    assert_eq!(
        aggregate.stage("$project"),
        Some(&Stage::Project(doc! {
            "k": { "$multiply": [{ "$divide": ["$sum(cost)", 1000] }, 2.5] },
            "_id": 0,
        }))
    );
}

#[test]
fn test_aggregate_over_expression() {
    let first = flatten_select(&[SelectExpression::function(
        "sum(impressions + clicks) / 1000",
        "sum",
        Some("k"),
    )])
    .unwrap();

    let (key, accumulator) = &first.accumulators[0];
    assert!(key.starts_with(TMP_EXPRESSION_PREFIX));
    assert_eq!(
        accumulator.to_bson(),
        Bson::Document(doc! { "$sum": { "$add": ["$impressions", "$clicks"] } })
    );
    assert_eq!(
        first.projections,
        doc! { "k": { "$divide": [format!("${}", key), 1000] } }
    );

    let second = flatten_select(&[SelectExpression::function(
        "sum( impressions+clicks ) * 2",
        "sum",
        None,
    )])
    .unwrap();
    assert_eq!(second.accumulators[0].0, *key);
}

#[test]
fn test_count_inside_composite() {
    let aggregation = flatten_select(&[SelectExpression::function(
        "count(id) + 1",
        "count",
        Some("n"),
    )])
    .unwrap();
    assert_eq!(
        aggregation.accumulators,
        vec![("count(id)".to_string(), Accumulator::Count(CountTarget::Field("$id".to_string())))]
    );
}

#[test]
fn test_single_aggregates_come_first() {
    let aggregation = flatten_select(&[
        SelectExpression::function("sum(a) / count(*)", "sum", Some("ratio")),
        SelectExpression::function("max(b)", "max", None),
    ])
    .unwrap();
    let keys: Vec<&str> = aggregation.accumulators.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["max(b)", "sum(a)", "count(*)"]);
}

#[test]
fn test_duplicate_accumulators_collapse() {
    let aggregation = flatten_select(&[
        SelectExpression::function("sum(cost)", "sum", None),
        SelectExpression::function("sum(cost) * 2", "sum", Some("double")),
    ])
    .unwrap();
    assert_eq!(aggregation.accumulators.len(), 1);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_invalid_select_field() {
    let err = SqlToMongo::new()
        .parse(indoc! {r#"
            SELECT user_id, name
            FROM logs
            where created_at >= date("2020-12-12")
            group by user_id
        "#})
        .unwrap_err();

    match err {
        Error::InvalidSelectField(fields) => assert_eq!(fields, vec!["name".to_string()]),
        other => panic!("Expected InvalidSelectField, got {:?}", other),
    }
}

#[test]
fn test_not_supported_function() {
    assert!(matches!(
        SqlToMongo::new().parse("SELECT concat(name) FROM users"),
        Err(Error::NotSupportedAggregateFunction(name)) if name == "concat"
    ));
    assert!(matches!(
        SqlToMongo::new().parse("SELECT sum(cost) / clicks FROM logs"),
        Err(Error::NotSupportedAggregateFunction(name)) if name == "clicks"
    ));
}

#[test]
fn test_malformed_composite() {
    assert!(matches!(
        SqlToMongo::new().parse("SELECT sum(cost) / FROM logs"),
        Err(Error::MalformedExpression(_))
    ));
}

#[test]
fn test_function_without_argument() {
    for sql in ["SELECT sum() FROM logs", "SELECT count() FROM logs GROUP BY user_id"] {
        assert!(
            matches!(SqlToMongo::new().parse(sql), Err(Error::MalformedExpression(_))),
            "Failed for: {}",
            sql
        );
    }
}
