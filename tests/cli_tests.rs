// tests/cli_tests.rs

#![cfg(feature = "cli")]

use serde_json::{Value, json};
use sql_to_mongodb_query::Error;
use sql_to_mongodb_query::cli::{
    CheckOptions, CheckResult, CliError, TranslateOptions, execute_check, execute_translate,
};

fn translate(sql: &str, pretty: bool) -> Result<String, CliError> {
    execute_translate(&TranslateOptions {
        sql: sql.to_string(),
        pretty,
    })
}

fn check(sql: &str) -> Result<CheckResult, CliError> {
    execute_check(&CheckOptions {
        sql: sql.to_string(),
    })
}

// ============================================================================
// Translate
// ============================================================================

#[test]
fn test_translate_find() {
    let output = translate("SELECT id FROM users WHERE age > 12 LIMIT 10", false).unwrap();
    assert_eq!(
        output,
        r#"{"type":"find","collection":"users","filter":{"age":{"$gt":12}},"options":{"skip":null,"limit":10,"projection":{"id":1},"sort":null,"hint":null}}"#
    );
}

#[test]
fn test_translate_aggregate() {
    let output = translate(
        "SELECT user_id, count(*) FROM logs GROUP BY user_id ORDER BY user_id DESC",
        false,
    )
    .unwrap();
    let value: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(
        value,
        json!({
            "type": "aggregate",
            "collection": "logs",
            "pipeline": [
                { "$match": {} },
                { "$group": { "_id": { "user_id": "$user_id" }, "count(*)": { "$sum": 1 } } },
                { "$project": { "user_id": "$_id.user_id", "count(*)": "$count(*)", "_id": 0 } },
                { "$sort": { "user_id": -1 } },
            ],
            "hint": null,
        })
    );
}

#[test]
fn test_translate_pretty() {
    let output = translate("  SELECT * FROM users  ", true).unwrap();
    assert!(output.starts_with("{\n  \"type\": \"find\",\n  \"collection\": \"users\""));

    let compact = translate("SELECT * FROM users", false).unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(&output).unwrap(),
        serde_json::from_str::<Value>(&compact).unwrap()
    );
}

#[test]
fn test_translate_errors() {
    assert!(matches!(translate("   ", false), Err(CliError::NoInput)));
    assert!(matches!(
        translate("SELECT * FROM where id = 1", false),
        Err(CliError::NoCollection)
    ));
    assert!(matches!(
        translate("DELETE FROM users", false),
        Err(CliError::Translate(Error::NotSupportedStatement(_)))
    ));
}

// ============================================================================
// Check
// ============================================================================

#[test]
fn test_check_find() {
    let result = check("SELECT * FROM users WHERE id = 1").unwrap();
    assert_eq!(
        result,
        CheckResult::Find {
            collection: "users".to_string()
        }
    );
    assert_eq!(result.to_string(), "OK: find on 'users'");
}

#[test]
fn test_check_aggregate() {
    let result = check("SELECT user_id, sum(cost) FROM logs GROUP BY user_id LIMIT 5").unwrap();
    assert_eq!(
        result,
        CheckResult::Aggregate {
            collection: "logs".to_string(),
            stages: 4
        }
    );
    assert_eq!(result.to_string(), "OK: aggregate on 'logs' (4 stages)");
}

#[test]
fn test_check_errors() {
    assert!(matches!(check(""), Err(CliError::NoInput)));
    assert!(matches!(check("SELECT * FROM where id = 1"), Err(CliError::NoCollection)));

    let err = check("SELECT name, count(*) FROM users GROUP BY role").unwrap_err();
    assert!(matches!(
        err,
        CliError::Translate(Error::InvalidSelectField(ref fields)) if fields == &vec!["name".to_string()]
    ));
    assert!(err.to_string().starts_with("Translation error: "));
    assert!(std::error::Error::source(&err).is_some());
}
