use sea_orm::{ColumnTrait, ColumnType, Condition, EntityTrait, Value, sea_query::SimpleExpr};
use serde_json::{Map, Value as JsonValue};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::table::TableDescriptor;

// Basic safety limit
const MAX_FIELD_VALUE_LENGTH: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Comparison {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// React Admin comparison suffixes, longest first so `_gte` wins over `_gt`.
const COMPARISON_SUFFIXES: [(&str, Comparison); 5] = [
    ("_gte", Comparison::Gte),
    ("_lte", Comparison::Lte),
    ("_neq", Comparison::Neq),
    ("_gt", Comparison::Gt),
    ("_lt", Comparison::Lt),
];

/// Split a filter key into (`field`, comparison). A key naming a real column is always
/// an equality test, even if it happens to end in a suffix.
fn parse_comparison_operator<'k>(table: &TableDescriptor, key: &'k str) -> (&'k str, Comparison) {
    if table.contains(key) {
        return (key, Comparison::Eq);
    }
    COMPARISON_SUFFIXES
        .iter()
        .find_map(|(suffix, op)| key.strip_suffix(suffix).map(|field| (field, *op)))
        .unwrap_or((key, Comparison::Eq))
}

fn invalid(key: &str, reason: &str) -> RepositoryError {
    RepositoryError::InvalidFilter(format!("{key}: {reason}"))
}

/// Convert one JSON scalar to a SQL value for `column`.
fn json_to_value<C: ColumnTrait>(
    column: C,
    key: &str,
    json: &JsonValue,
) -> Result<Value, RepositoryError> {
    match json {
        JsonValue::String(s) => {
            if s.len() > MAX_FIELD_VALUE_LENGTH {
                return Err(invalid(key, "value too long"));
            }
            if matches!(column.def().get_column_type(), ColumnType::Uuid) {
                let id = Uuid::parse_str(s).map_err(|_| invalid(key, "expected a UUID"))?;
                Ok(Value::from(id))
            } else {
                Ok(Value::from(s.clone()))
            }
        }
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::from)
            .or_else(|| n.as_u64().map(Value::from))
            .or_else(|| n.as_f64().map(Value::from))
            .ok_or_else(|| invalid(key, "number out of range")),
        JsonValue::Bool(b) => Ok(Value::from(*b)),
        JsonValue::Null => Err(invalid(key, "null is not allowed here")),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(invalid(key, "expected a scalar value")),
    }
}

fn json_to_values<C: ColumnTrait>(
    column: C,
    key: &str,
    items: &[JsonValue],
) -> Result<Vec<Value>, RepositoryError> {
    items
        .iter()
        .map(|item| json_to_value(column, key, item))
        .collect()
}

fn build_expr<C: ColumnTrait>(
    column: C,
    key: &str,
    op: Comparison,
    json: &JsonValue,
) -> Result<SimpleExpr, RepositoryError> {
    let expr = match (json, op) {
        (JsonValue::Null, Comparison::Eq) => column.is_null(),
        (JsonValue::Null, Comparison::Neq) => column.is_not_null(),
        (JsonValue::Null, _) => return Err(invalid(key, "null only supports equality")),
        (JsonValue::Array(items), Comparison::Eq) => {
            column.is_in(json_to_values(column, key, items)?)
        }
        (JsonValue::Array(items), Comparison::Neq) => {
            column.is_not_in(json_to_values(column, key, items)?)
        }
        (JsonValue::Array(_), _) => return Err(invalid(key, "lists only support equality")),
        (scalar, op) => {
            let value = json_to_value(column, key, scalar)?;
            match op {
                Comparison::Eq => column.eq(value),
                Comparison::Neq => column.ne(value),
                Comparison::Gt => column.gt(value),
                Comparison::Gte => column.gte(value),
                Comparison::Lt => column.lt(value),
                Comparison::Lte => column.lte(value),
            }
        }
    };
    Ok(expr)
}

/// Build an AND condition from a JSON filter object, checking every key against `table`.
///
/// - `{"title": "x"}` → `title = 'x'`
/// - `{"title": null}` → `title IS NULL`
/// - `{"id": [1, 2]}` → `id IN (1, 2)`
/// - `{"priority_gte": 3}` → `priority >= 3` (also `_gt`, `_lte`, `_lt`, `_neq`)
///
/// # Errors
///
/// [`RepositoryError::UnknownField`] for keys that are not columns of `table`,
/// [`RepositoryError::InvalidFilter`] for values that cannot be compared.
pub fn conditions_from_filter<E: EntityTrait>(
    table: &TableDescriptor,
    filter: &Map<String, JsonValue>,
) -> Result<Condition, RepositoryError> {
    let mut condition = Condition::all();
    for (key, json) in filter {
        let (field, op) = parse_comparison_operator(table, key);
        table.require_field(field)?;
        let column = E::Column::from_str(field).map_err(|_| RepositoryError::UnknownField {
            field: field.to_string(),
            table: table.name().to_string(),
        })?;
        condition = condition.add(build_expr(column, key, op, json)?);
    }
    Ok(condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryFilter, QueryTrait};
    use serde_json::json;

    mod gizmo {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
        #[sea_orm(table_name = "gizmos")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: Uuid,
            pub title: String,
            pub priority: i32,
            pub weight: f64,
            pub active: bool,
            pub cost_lt: Option<i32>,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    fn table() -> TableDescriptor {
        TableDescriptor::of::<gizmo::Entity>().unwrap()
    }

    fn sql_for(filter: serde_json::Value) -> Result<String, RepositoryError> {
        let filter = filter.as_object().unwrap().clone();
        let condition = conditions_from_filter::<gizmo::Entity>(&table(), &filter)?;
        Ok(gizmo::Entity::find()
            .filter(condition)
            .build(DbBackend::Sqlite)
            .to_string())
    }

    #[test]
    fn test_equality() {
        let sql = sql_for(json!({"title": "lamp", "active": true})).unwrap();
        assert!(sql.contains(r#""gizmos"."title" = 'lamp'"#), "{sql}");
        assert!(sql.contains(r#""gizmos"."active" = "#), "{sql}");
    }

    #[test]
    fn test_comparison_suffixes() {
        let sql = sql_for(json!({
            "priority_gte": 3,
            "priority_lt": 9,
            "weight_gt": 1.5,
            "title_neq": "lamp"
        }))
        .unwrap();
        assert!(sql.contains(r#""gizmos"."priority" >= 3"#), "{sql}");
        assert!(sql.contains(r#""gizmos"."priority" < 9"#), "{sql}");
        assert!(sql.contains(r#""gizmos"."weight" > 1.5"#), "{sql}");
        assert!(sql.contains(r#""gizmos"."title" <> 'lamp'"#), "{sql}");
    }

    #[test]
    fn test_real_column_wins_over_suffix() {
        let sql = sql_for(json!({"cost_lt": 4})).unwrap();
        assert!(sql.contains(r#""gizmos"."cost_lt" = 4"#), "{sql}");
    }

    #[test]
    fn test_null_and_lists() {
        let sql = sql_for(json!({"cost_lt": null, "priority": [1, 2]})).unwrap();
        assert!(sql.contains(r#""gizmos"."cost_lt" IS NULL"#), "{sql}");
        assert!(sql.contains(r#""gizmos"."priority" IN (1, 2)"#), "{sql}");

        let sql = sql_for(json!({"cost_lt_neq": null})).unwrap();
        assert!(sql.contains(r#""gizmos"."cost_lt" IS NOT NULL"#), "{sql}");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = sql_for(json!({"colour": "red"})).unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownField { ref field, .. } if field == "colour"));

        let err = sql_for(json!({"colour_gte": 1})).unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownField { ref field, .. } if field == "colour"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            sql_for(json!({"title": {"nested": true}})),
            Err(RepositoryError::InvalidFilter(_))
        ));
        assert!(matches!(
            sql_for(json!({"priority_gt": null})),
            Err(RepositoryError::InvalidFilter(_))
        ));
        assert!(matches!(
            sql_for(json!({"priority_gte": [1, 2]})),
            Err(RepositoryError::InvalidFilter(_))
        ));
        assert!(matches!(
            sql_for(json!({"id": "not-a-uuid"})),
            Err(RepositoryError::InvalidFilter(_))
        ));
        assert!(matches!(
            sql_for(json!({"title": "x".repeat(MAX_FIELD_VALUE_LENGTH + 1)})),
            Err(RepositoryError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_large_integers_stay_exact() {
        let sql = sql_for(json!({"priority_lt": u64::MAX})).unwrap();
        assert!(sql.contains(r#""gizmos"."priority" < 18446744073709551615"#), "{sql}");
    }

    #[test]
    fn test_uuid_column_parses_ids() {
        let id = Uuid::new_v4();
        assert!(sql_for(json!({"id": id.to_string()})).is_ok());
        assert!(sql_for(json!({"id": [Uuid::new_v4().to_string(), id.to_string()]})).is_ok());
    }

    #[test]
    fn test_empty_filter_is_empty_condition() {
        let condition = conditions_from_filter::<gizmo::Entity>(&table(), &Map::new()).unwrap();
        assert!(condition.is_empty());
    }
}
