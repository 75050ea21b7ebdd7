//! Join collection for a whole request.

use std::collections::HashSet;

use crate::error::Result;
use crate::path::{resolve_path, JoinClause};
use crate::request::QueryParams;
use crate::schema::Schema;

/// Gathers the joins implied by every field path of `params`.
///
/// Paths are visited in encounter order (columns, filter fields, group-by,
/// order-by). A clause reached a second time, through any path, is dropped,
/// so the first occurrence fixes its position.
///
/// # Errors
///
/// Returns a schema error when `table`, or a table reached through a
/// relation, is not declared.
pub fn collect_joins(schema: &Schema, table: &str, params: &QueryParams) -> Result<Vec<JoinClause>> {
    let mut seen = HashSet::new();
    let mut joins = Vec::new();
    for path in params.field_paths() {
        for join in resolve_path(schema, table, path)?.joins {
            if seen.insert(join.clone()) {
                joins.push(join);
            }
        }
    }
    Ok(joins)
}

/// Renders join clauses separated by single spaces.
#[must_use]
pub fn render_joins(joins: &[JoinClause]) -> String {
    joins
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Condition, FilterTree};
    use crate::schema::{ColumnDef, DataType, RelationDef, TableSchema};

    fn schema() -> Schema {
        Schema::new()
            .table(
                TableSchema::new("countries")
                    .column(ColumnDef::new("id", DataType::Uuid).primary_key())
                    .column(ColumnDef::new("name", DataType::Text))
                    .column(ColumnDef::new("region", DataType::Uuid))
                    .relation(RelationDef::new("region", "regions", "region", "id"))
                    .relation(RelationDef::new("cities", "cities", "id", "country")),
            )
            .table(
                TableSchema::new("regions")
                    .column(ColumnDef::new("id", DataType::Uuid).primary_key())
                    .column(ColumnDef::new("planet", DataType::Int8))
                    .relation(RelationDef::new("planet", "planets", "planet", "id")),
            )
            .table(TableSchema::new("planets").column(ColumnDef::new("id", DataType::Int8)))
            .table(TableSchema::new("cities").column(ColumnDef::new("country", DataType::Uuid)))
    }

    const REGIONS: &str = "INNER JOIN `regions` ON `regions`.`id` = `countries`.`region`";
    const PLANETS: &str = "INNER JOIN `planets` ON `planets`.`id` = `regions`.`planet`";
    const CITIES: &str = "INNER JOIN `cities` ON `cities`.`country` = `countries`.`id`";

    fn rendered(params: &QueryParams) -> Vec<String> {
        collect_joins(&schema(), "countries", params)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_no_relations_no_joins() {
        assert!(rendered(&QueryParams::new().columns(&["name", "id"])).is_empty());
    }

    #[test]
    fn test_deduplicated_in_encounter_order() {
        let params = QueryParams::new()
            .columns(&["name", "region.name", "cities.name"])
            .order_by("-region.id")
            .order_by("cities.name")
            .group_by("region.name");
        assert_eq!(rendered(&params), vec![REGIONS, CITIES]);
    }

    #[test]
    fn test_shared_prefix_is_joined_once() {
        let params = QueryParams::new()
            .columns(&["name"])
            .order_by("-region.planet.id")
            .order_by("cities.name");
        assert_eq!(rendered(&params), vec![REGIONS, PLANETS, CITIES]);
    }

    #[test]
    fn test_filter_fields_come_before_ordering() {
        let params = QueryParams::new()
            .order_by("region.id")
            .filter(FilterTree::new().or(vec![
                FilterTree::new().field("cities.name", Condition::eq("Oslo")),
            ]));
        assert_eq!(rendered(&params), vec![CITIES, REGIONS]);
    }

    #[test]
    fn test_render_joins() {
        let params = QueryParams::new().columns(&["region.planet.id"]);
        let joins = collect_joins(&schema(), "countries", &params).unwrap();
        assert_eq!(render_joins(&joins), format!("{REGIONS} {PLANETS}"));
        assert_eq!(render_joins(&[]), "");
    }
}
