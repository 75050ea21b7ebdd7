#![allow(dead_code)]

use restql_core::Schema;
use serde_json::json;

/// Countries belong to a region, regions to a planet, and cities to a country.
pub fn world() -> Schema {
    Schema::from_json(json!({
        "countries": {
            "columns": {
                "id": { "type": "uuid", "primaryKey": true },
                "name": { "type": "text", "notNull": true },
                "region": { "type": "uuid" },
                "population": { "type": "int8", "default": 0 }
            },
            "relations": {
                "region": { "table": "regions", "fromKey": "region", "toKey": "id" },
                "cities": { "table": "cities", "fromKey": "id", "toKey": "country" }
            }
        },
        "regions": {
            "columns": {
                "id": { "type": "uuid", "primaryKey": true },
                "name": { "type": "text" },
                "planet": { "type": "int8" }
            },
            "relations": {
                "planet": { "table": "planets", "fromKey": "planet", "toKey": "id" }
            }
        },
        "planets": {
            "columns": {
                "id": { "type": "int8", "primaryKey": true },
                "name": { "type": "text" }
            }
        },
        "cities": {
            "columns": {
                "id": { "type": "uuid", "primaryKey": true },
                "name": { "type": "text" },
                "country": { "type": "uuid" }
            }
        },
        "users": {
            "columns": {
                "id": { "type": "int8", "primaryKey": true },
                "name": { "type": "varchar", "unique": true },
                "active": { "type": "boolean", "default": true }
            }
        },
        "audit_log": {
            "columns": {
                "line": { "type": "text" },
                "created_at": { "type": "timestamptz" }
            }
        }
    }))
    .unwrap_or_else(|e| panic!("fixture schema must decode: {e}"))
}

pub const JOIN_REGIONS: &str = "INNER JOIN `regions` ON `regions`.`id` = `countries`.`region`";
pub const JOIN_PLANETS: &str = "INNER JOIN `planets` ON `planets`.`id` = `regions`.`planet`";
pub const JOIN_CITIES: &str = "INNER JOIN `cities` ON `cities`.`country` = `countries`.`id`";
