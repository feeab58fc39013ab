// tests/parser_tests.rs

use indoc::indoc;
use sql_to_mongodb_query::ast::{
    Condition, IndexHintKind, Limit, SelectExpression, SelectStatement, SortDirection, Statement,
};
use sql_to_mongodb_query::parser::{ParseError, parse_statement};

fn select(sql: &str) -> SelectStatement {
    match parse_statement(sql).unwrap() {
        Some(Statement::Select(select)) => select,
        other => panic!("Expected a SELECT statement, got {:?}", other),
    }
}

fn leaf_texts(conditions: &[Condition]) -> Vec<&str> {
    conditions.iter().map(|c| c.expr.as_str()).collect()
}

// ============================================================================
// Statement detection
// ============================================================================

#[test]
fn test_non_statement() {
    assert_eq!(parse_statement("random sql query").unwrap(), None);
    assert_eq!(parse_statement("").unwrap(), None);
    assert_eq!(parse_statement("   ;  ").unwrap(), None);
}

#[test]
fn test_other_statement_kinds() {
    for (sql, kind) in [
        ("DELETE FROM USERS where id = 1", "DELETE"),
        ("update users set a = 1", "UPDATE"),
        ("insert into users values (1)", "INSERT"),
        ("Show tables", "SHOW"),
    ] {
        assert_eq!(
            parse_statement(sql).unwrap(),
            Some(Statement::Other {
                kind: kind.to_string()
            }),
            "Failed for input: {}",
            sql
        );
    }
}

#[test]
fn test_only_first_statement_is_read() {
    let statement = select("SELECT * FROM users; DELETE FROM users");
    assert_eq!(statement.from[0].table, "users");
}

#[test]
fn test_lex_error_is_reported() {
    assert!(matches!(
        parse_statement("SELECT * FROM users WHERE name = 'abc"),
        Err(ParseError::Lex(_))
    ));
}

// ============================================================================
// Select list
// ============================================================================

#[test]
fn test_select_fields() {
    let statement = select("SELECT id, name FROM users");
    assert_eq!(
        statement.expr,
        vec![SelectExpression::field("id"), SelectExpression::field("name")]
    );
}

#[test]
fn test_select_star_and_distinct() {
    let statement = select("SELECT DISTINCT * FROM users");
    assert_eq!(statement.expr, vec![SelectExpression::field("*")]);
}

#[test]
fn test_select_functions_and_aliases() {
    let statement = select(
        "SELECT user_id, count(*), sum(time) AS total, sum(cost) / count(*) cpc FROM logs",
    );
    assert_eq!(
        statement.expr,
        vec![
            SelectExpression::field("user_id"),
            SelectExpression::function("count(*)", "count", None),
            SelectExpression::function("sum(time)", "sum", Some("total")),
            SelectExpression::function("sum(cost) / count(*)", "sum", Some("cpc")),
        ]
    );
}

#[test]
fn test_select_nested_field() {
    let statement = select("SELECT device_info.device_type FROM clicks");
    assert_eq!(
        statement.expr,
        vec![SelectExpression::field("device_info.device_type")]
    );
}

#[test]
fn test_empty_select_list() {
    let statement = select("SELECT FROM users");
    assert!(statement.expr.is_empty());
    assert_eq!(statement.from[0].table, "users");
}

// ============================================================================
// FROM
// ============================================================================

#[test]
fn test_from_database_and_alias() {
    let statement = select("SELECT * FROM shop.users u");
    let table = &statement.from[0];
    assert_eq!(table.table, "users");
    assert_eq!(table.database.as_deref(), Some("shop"));
    assert_eq!(table.alias.as_deref(), Some("u"));
}

#[test]
fn test_missing_table() {
    let statement = select("SELECT * FROM where id = 1");
    assert!(statement.from.is_empty());
    assert_eq!(leaf_texts(&statement.where_conditions), vec!["id = 1"]);
}

// ============================================================================
// Conditions
// ============================================================================

#[test]
fn test_where_conditions_are_flat() {
    let statement = select("SELECT * FROM users WHERE a = 1 or (b = 2 and c = 3)");
    assert_eq!(
        leaf_texts(&statement.where_conditions),
        vec!["a = 1", "OR", "(b = 2", "AND", "c = 3)"]
    );
    assert!(statement.where_conditions[1].is_operator);
    assert_eq!(statement.where_conditions[2].bracket_depth(), 1);
    assert_eq!(statement.where_conditions[4].bracket_depth(), -1);
}

#[test]
fn test_symbolic_connectives() {
    let statement = select("SELECT * FROM users WHERE a = 1 && b = 2 || c = 3");
    assert_eq!(
        leaf_texts(&statement.where_conditions),
        vec!["a = 1", "AND", "b = 2", "OR", "c = 3"]
    );
}

#[test]
fn test_condition_identifiers() {
    let statement = select(
        "SELECT * FROM users WHERE created_at >= date('2020-12-12') AND name LIKE 'x' AND name IS NOT NULL",
    );
    let conditions = &statement.where_conditions;
    assert_eq!(conditions[0].identifiers, vec!["created_at", "date", "2020-12-12"]);
    assert_eq!(conditions[2].identifiers, vec!["name", "x"]);
    assert_eq!(conditions[4].identifiers, vec!["name"]);
}

#[test]
fn test_brackets_inside_literals_do_not_count() {
    let statement = select("SELECT * FROM users WHERE 'nddcoder (dung)' = name");
    assert_eq!(statement.where_conditions.len(), 1);
    assert_eq!(statement.where_conditions[0].bracket_depth(), 0);
}

#[test]
fn test_between_and_is_not_a_connective() {
    let statement = select("SELECT * FROM users WHERE age BETWEEN 12 AND 60 AND active = true");
    assert_eq!(
        leaf_texts(&statement.where_conditions),
        vec!["age BETWEEN 12 AND 60", "AND", "active = true"]
    );
}

#[test]
fn test_having() {
    let statement = select(
        "SELECT user_id, count(*) FROM logs GROUP BY user_id HAVING count(*) > 2 and sum(time) > 1000",
    );
    assert_eq!(
        leaf_texts(&statement.having),
        vec!["count(*) > 2", "AND", "sum(time) > 1000"]
    );
}

#[test]
fn test_stray_closing_bracket_is_ignored() {
    let statement = select("SELECT * FROM users WHERE (a = 1 or b = 2) or (c = 3)) limit 5");
    assert_eq!(statement.where_conditions.len(), 5);
    assert_eq!(statement.limit.map(|l| l.row_count), Some(5));
}

// ============================================================================
// GROUP BY / ORDER BY / LIMIT / hints
// ============================================================================

#[test]
fn test_group_and_order() {
    let statement = select(
        "SELECT * FROM users group by user_id, info.type order by created_at asc, modified_at DESC",
    );
    let group: Vec<&str> = statement.group.iter().map(|g| g.expr.as_str()).collect();
    assert_eq!(group, vec!["user_id", "info.type"]);

    let order: Vec<(&str, SortDirection)> = statement
        .order
        .iter()
        .map(|o| (o.expr.as_str(), o.direction))
        .collect();
    assert_eq!(
        order,
        vec![
            ("created_at", SortDirection::Asc),
            ("modified_at", SortDirection::Desc)
        ]
    );
}

#[test]
fn test_limit_forms() {
    assert_eq!(
        select("SELECT * FROM users limit 10").limit,
        Some(Limit {
            offset: 0,
            row_count: 10
        })
    );
    assert_eq!(
        select("SELECT * FROM users limit 20, 10").limit,
        Some(Limit {
            offset: 20,
            row_count: 10
        })
    );
    assert_eq!(
        select("SELECT * FROM users limit 10 offset 20").limit,
        Some(Limit {
            offset: 20,
            row_count: 10
        })
    );
}

#[test]
fn test_invalid_limit() {
    assert!(matches!(
        parse_statement("SELECT * FROM users limit ten"),
        Err(ParseError::UnexpectedToken { .. })
    ));
}

#[test]
fn test_index_hints() {
    let statement = select("SELECT * FROM users use index index_name");
    assert_eq!(statement.index_hints[0].kind, IndexHintKind::Use);
    assert_eq!(statement.index_hints[0].indexes, vec!["index_name"]);

    let statement = select("SELECT * FROM users FORCE KEY FOR ORDER BY (a_idx, b_idx)");
    assert_eq!(statement.index_hints[0].kind, IndexHintKind::Force);
    assert_eq!(statement.index_hints[0].indexes, vec!["a_idx", "b_idx"]);
}

#[test]
fn test_clauses_in_any_order() {
    let statement = select(indoc! {"
        SELECT user_id, count(*), sum(time)
        FROM logs
        use index index_name
        where created_at >= date(\"2020-12-12\")
        group by user_id
        order by count(*) desc
        limit 20, 10
        having count(*) > 2 and sum(time) > 1000
    "});

    assert_eq!(statement.from[0].table, "logs");
    assert_eq!(statement.index_hints[0].indexes, vec!["index_name"]);
    assert_eq!(statement.where_conditions.len(), 1);
    assert_eq!(statement.group[0].expr, "user_id");
    assert_eq!(statement.order[0].expr, "count(*)");
    assert_eq!(statement.order[0].direction, SortDirection::Desc);
    assert_eq!(
        statement.limit,
        Some(Limit {
            offset: 20,
            row_count: 10
        })
    );
    assert_eq!(statement.having.len(), 3);
}

#[test]
fn test_unknown_clause() {
    assert!(matches!(
        parse_statement("SELECT * FROM users WINDOW w"),
        Err(ParseError::UnexpectedToken { .. })
    ));
}
