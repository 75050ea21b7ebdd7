mod common;

use common::world;
use restql_core::{
    validate_params, CompileError, DataType, QueryParams, Schema, SchemaError, SqlValue,
};
use serde_json::json;

#[test]
fn fixture_schema_is_consistent() {
    let schema = world();
    assert!(schema.validate().is_ok());
    assert_eq!(
        schema.table_names().collect::<Vec<_>>(),
        vec!["countries", "regions", "planets", "cities", "users", "audit_log"]
    );
    assert_eq!(schema.primary_key_of("planets").unwrap(), Some("id"));
    assert_eq!(schema.primary_key_of("audit_log").unwrap(), None);

    let population = schema.lookup_column("countries", "population").unwrap().unwrap();
    assert_eq!(population.data_type, DataType::Int8);
    assert_eq!(population.default, Some(SqlValue::Int(0)));
}

#[test]
fn dangling_relation_target_is_rejected() {
    let schema = Schema::from_json(json!({
        "countries": {
            "columns": { "id": { "type": "uuid", "primaryKey": true } },
            "relations": {
                "moons": { "table": "moons", "fromKey": "id", "toKey": "country" }
            }
        }
    }))
    .unwrap();
    assert!(matches!(
        schema.validate(),
        Err(SchemaError::UnknownTable(table)) if table == "moons"
    ));
}

#[test]
fn malformed_declaration_is_rejected() {
    assert!(Schema::from_json_str("{\"users\": {\"columns\": {\"id\": {\"type\": \"bignum\"}}}}").is_err());
    assert!(Schema::from_json(json!(["users"])).is_err());
}

#[test]
fn strict_validation_rejects_what_compilation_tolerates() {
    let schema = world();
    let params = QueryParams::from_json(&json!({
        "columns": ["name"],
        "where": { "foo.name": { "$eq": "x" } }
    }))
    .unwrap();
    assert!(restql_core::find_raw(&schema, "countries", &params).is_ok());
    assert!(matches!(
        validate_params(&schema, "countries", &params),
        Err(CompileError::Schema(SchemaError::UnknownRelation { .. }))
    ));

    let params = QueryParams::new()
        .columns(&["region.planet.name", "cities.*"])
        .group_by("region.name")
        .order_by("-population");
    assert!(validate_params(&schema, "countries", &params).is_ok());
}

#[test]
fn bad_filter_json_is_reported() {
    assert!(matches!(
        QueryParams::from_json(&json!({ "where": { "name": { "$near": 1 } } })),
        Err(CompileError::InvalidFilter(_))
    ));
    assert!(matches!(
        QueryParams::from_json(&json!({ "where": { "population": { "$between": [1] } } })),
        Err(CompileError::InvalidFilter(_))
    ));
}
