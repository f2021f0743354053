//! JSON filters for `count`, `exists` and `list`.
//!
//! Conditions built in code are already tied to the table through the entity's `Column`
//! type. Filters that arrive as data (query strings, config files) are checked here
//! against the repository's [`TableDescriptor`] before they reach the database.
//!
//! ```rust,ignore
//! let condition = filter_conditions::<note::Entity>(repo.table(), r#"{"priority_gte": 3}"#)?;
//! let notes = repo.list(condition).await?;
//! ```

pub mod conditions;

use sea_orm::{Condition, EntityTrait};
use serde_json::{Map, Value as JsonValue};

use crate::errors::RepositoryError;
use crate::table::TableDescriptor;

pub use conditions::conditions_from_filter;

/// Parse a JSON filter object. A blank string is an empty filter.
///
/// # Errors
///
/// [`RepositoryError::InvalidFilter`] if the input is not a JSON object.
pub fn parse_filter(filter: &str) -> Result<Map<String, JsonValue>, RepositoryError> {
    if filter.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<JsonValue>(filter) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(_) => Err(RepositoryError::InvalidFilter(
            "filter must be a JSON object".to_string(),
        )),
        Err(e) => {
            tracing::debug!(error = %e, "invalid JSON in filter string");
            Err(RepositoryError::InvalidFilter(e.to_string()))
        }
    }
}

/// [`parse_filter`] followed by [`conditions_from_filter`].
///
/// # Errors
///
/// See [`parse_filter`] and [`conditions_from_filter`].
pub fn filter_conditions<E: EntityTrait>(
    table: &TableDescriptor,
    filter: &str,
) -> Result<Condition, RepositoryError> {
    let map = parse_filter(filter)?;
    conditions_from_filter::<E>(table, &map)
}
