use async_trait::async_trait;
use sea_orm::{Condition, EntityTrait, PrimaryKeyTrait, Value, sea_query::IntoCondition};

use crate::errors::RepositoryError;
use crate::table::TableDescriptor;

/// Plain data row of an entity.
pub type ModelOf<E> = <E as EntityTrait>::Model;

/// Primary key value of an entity, e.g. `i64` or `Uuid`.
pub type PrimaryKeyOf<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// Create, retrieve, update, delete, count, exists and list over one table.
///
/// The unchecked `update`, `delete` and `delete_many` succeed even when no row is affected.
/// Use the `*_checked` variants with `check_exist = true` to fail fast instead.
///
/// Operations that take conditions AND them together. An empty
/// [`Condition::all()`] matches every row; see [`all_of`] for building one from a
/// collection.
#[async_trait]
pub trait CrudRepository: Send + Sync {
    type Entity: EntityTrait;

    /// The table this repository is bound to.
    fn table(&self) -> &TableDescriptor;

    /// Insert a record.
    ///
    /// Tables with auto-increment keys ignore the key in `to_create` and return a new record
    /// carrying the generated key. Other tables insert and return `to_create` as given.
    ///
    /// # Errors
    ///
    /// Any failure is returned as [`RepositoryError::Create`].
    async fn create(
        &self,
        to_create: ModelOf<Self::Entity>,
    ) -> Result<ModelOf<Self::Entity>, RepositoryError>;

    /// Select by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn retrieve(
        &self,
        id: PrimaryKeyOf<Self::Entity>,
    ) -> Result<Option<ModelOf<Self::Entity>>, RepositoryError>;

    /// Select by a column named at runtime.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::UnknownField`] if `field` is not a column of the table,
    /// [`RepositoryError::TooManyRows`] if more than one row matches.
    async fn retrieve_by<V>(
        &self,
        field: &str,
        value: V,
    ) -> Result<Option<ModelOf<Self::Entity>>, RepositoryError>
    where
        V: Into<Value> + Send;

    /// Select by a typed column.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::TooManyRows`] if more than one row matches.
    async fn retrieve_by_column<V>(
        &self,
        column: <Self::Entity as EntityTrait>::Column,
        value: V,
    ) -> Result<Option<ModelOf<Self::Entity>>, RepositoryError>
    where
        V: Into<Value> + Send;

    /// Update by primary key without checking the row exists. Returns rows affected.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the statement fails.
    async fn update(&self, to_update: ModelOf<Self::Entity>) -> Result<u64, RepositoryError> {
        self.update_checked(to_update, false).await
    }

    /// Update by primary key, optionally checking the row exists first.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Update`] if `check_exist` is set and the row is missing.
    async fn update_checked(
        &self,
        to_update: ModelOf<Self::Entity>,
        check_exist: bool,
    ) -> Result<u64, RepositoryError>;

    /// Delete by primary key without checking the row exists. Returns rows affected.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the statement fails.
    async fn delete(&self, id: PrimaryKeyOf<Self::Entity>) -> Result<u64, RepositoryError> {
        self.delete_checked(id, false).await
    }

    /// Delete by primary key, optionally checking the row exists first.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Delete`] if `check_exist` is set and the row is missing.
    async fn delete_checked(
        &self,
        id: PrimaryKeyOf<Self::Entity>,
        check_exist: bool,
    ) -> Result<u64, RepositoryError>;

    /// Delete every row whose key is in `ids`. Returns rows affected.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the statement fails.
    async fn delete_many(
        &self,
        ids: Vec<PrimaryKeyOf<Self::Entity>>,
    ) -> Result<u64, RepositoryError> {
        self.delete_many_checked(ids, false).await
    }

    /// Delete every row whose key is in `ids`, optionally checking that at least one exists.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Delete`] if `check_exist` is set and none of the keys exist.
    async fn delete_many_checked(
        &self,
        ids: Vec<PrimaryKeyOf<Self::Entity>>,
        check_exist: bool,
    ) -> Result<u64, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn count(&self, conditions: Condition) -> Result<u64, RepositoryError>;

    /// Whether any row satisfies `conditions`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn exists(&self, conditions: Condition) -> Result<bool, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn list(
        &self,
        conditions: Condition,
    ) -> Result<Vec<ModelOf<Self::Entity>>, RepositoryError>;
}

/// AND together a collection of conditions or expressions.
///
/// ```rust,ignore
/// let open_and_recent = all_of([
///     note::Column::Archived.eq(false),
///     note::Column::Priority.gte(3),
/// ]);
/// let count = repo.count(open_and_recent).await?;
/// ```
pub fn all_of<I, C>(conditions: I) -> Condition
where
    I: IntoIterator<Item = C>,
    C: IntoCondition,
{
    conditions
        .into_iter()
        .fold(Condition::all(), |acc, c| acc.add(c.into_condition()))
}
