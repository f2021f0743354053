use sea_orm::{
    ColumnTrait, ColumnType, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait,
};
use serde::Serialize;

use crate::errors::RepositoryError;

/// How a table's primary key gets its value on insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// The database generates the key, e.g. an `i64` identity column.
    AutoIncrement,
    /// The caller supplies the key, e.g. a `Uuid`.
    Supplied,
}

/// Name, fields and primary key of the table a repository is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    name: String,
    schema: Option<String>,
    fields: Vec<String>,
    primary_key: String,
    key_strategy: KeyStrategy,
}

impl TableDescriptor {
    /// Read the descriptor of a Sea-ORM entity.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::MissingPrimaryKey`] if the entity has no primary key column
    /// and [`RepositoryError::CompositePrimaryKey`] if it has more than one.
    pub fn of<E: EntityTrait>() -> Result<Self, RepositoryError> {
        let entity = E::default();
        let name = entity.table_name().to_string();

        let keys: Vec<E::Column> = E::PrimaryKey::iter()
            .map(PrimaryKeyToColumn::into_column)
            .collect();
        let key = match keys.as_slice() {
            [] => return Err(RepositoryError::MissingPrimaryKey { table: name }),
            [key] => *key,
            _ => {
                return Err(RepositoryError::CompositePrimaryKey {
                    table: name,
                    count: keys.len(),
                });
            }
        };

        // Only integer keys are generated by the database, whatever the entity flag says
        let key_strategy = if <E::PrimaryKey as PrimaryKeyTrait>::auto_increment()
            && is_integer(key.def().get_column_type())
        {
            KeyStrategy::AutoIncrement
        } else {
            KeyStrategy::Supplied
        };

        Ok(Self {
            schema: entity.schema_name().map(ToString::to_string),
            fields: E::Column::iter().map(|c| c.as_str().to_string()).collect(),
            name,
            primary_key: key.as_str().to_string(),
            key_strategy,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Column names in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    #[must_use]
    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    #[must_use]
    pub fn is_primary_key(&self, field: &str) -> bool {
        self.primary_key == field
    }

    /// Fail with [`RepositoryError::UnknownField`] unless `field` belongs to this table.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UnknownField`] for fields outside the table.
    pub fn require_field(&self, field: &str) -> Result<(), RepositoryError> {
        if self.contains(field) {
            Ok(())
        } else {
            Err(RepositoryError::UnknownField {
                field: field.to_string(),
                table: self.name.clone(),
            })
        }
    }
}

fn is_integer(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned
    )
}
