use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, IdenStatic,
    IntoActiveModel, Iterable, ModelTrait, PaginatorTrait, PrimaryKeyToColumn, QueryFilter,
    QuerySelect, Value,
    sea_query::{IntoValueTuple, ValueTuple},
};
use std::marker::PhantomData;
use std::str::FromStr;

use super::repository::{CrudRepository, ModelOf, PrimaryKeyOf};
use crate::errors::{CreateRecordError, DeleteRecordError, RepositoryError, UpdateRecordError};
use crate::table::{KeyStrategy, TableDescriptor};

/// Enough rows to tell "exactly one" from "more than one".
const UNIQUE_PROBE_LIMIT: u64 = 2;

/// [`CrudRepository`] over a Sea-ORM entity `E` and its active model `A`.
///
/// The repository binds to the table once, in [`EntityRepository::new`], and holds nothing
/// else besides the connection handle. Every operation is one awaited statement, two when
/// an existence pre-check is requested, and none of them opens a transaction.
///
/// ```rust,ignore
/// let notes = EntityRepository::<note::Entity, note::ActiveModel>::new(db.clone())?;
/// let created = notes.create(note::Model { id: 0, title: "hello".into(), ..Default::default() }).await?;
/// assert_ne!(created.id, 0);
/// ```
pub struct EntityRepository<E, A>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
{
    db: DatabaseConnection,
    table: TableDescriptor,
    primary_key: E::Column,
    _active_model: PhantomData<fn() -> A>,
}

impl<E, A> EntityRepository<E, A>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
{
    /// Bind a repository to `E`'s table.
    ///
    /// # Errors
    ///
    /// Fails if the entity does not have exactly one primary key column.
    pub fn new(db: DatabaseConnection) -> Result<Self, RepositoryError> {
        let table = TableDescriptor::of::<E>()?;
        let primary_key = E::PrimaryKey::iter()
            .next()
            .map(PrimaryKeyToColumn::into_column)
            .ok_or_else(|| RepositoryError::MissingPrimaryKey {
                table: table.name().to_string(),
            })?;

        tracing::debug!(
            table = table.name(),
            primary_key = table.primary_key(),
            key_strategy = ?table.key_strategy(),
            "bound repository"
        );

        Ok(Self {
            db,
            table,
            primary_key,
            _active_model: PhantomData,
        })
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    #[must_use]
    pub fn primary_key_column(&self) -> E::Column {
        self.primary_key
    }

    fn key_value(&self, id: PrimaryKeyOf<E>) -> Result<Value, RepositoryError> {
        match id.into_value_tuple() {
            ValueTuple::One(value) => Ok(value),
            _ => Err(RepositoryError::CompositePrimaryKey {
                table: self.table.name().to_string(),
                count: E::PrimaryKey::iter().count(),
            }),
        }
    }

    fn by_key(&self, key: Value) -> Condition {
        Condition::all().add(self.primary_key.eq(key))
    }

    fn create_error(&self, source: DbErr) -> RepositoryError {
        match source {
            // Backends without RETURNING re-select the inserted row and report a miss as
            // RecordNotFound
            DbErr::RecordNotInserted | DbErr::RecordNotFound(_)
                if self.table.key_strategy() == KeyStrategy::AutoIncrement =>
            {
                CreateRecordError::MissingPrimaryKey {
                    table: self.table.name().to_string(),
                }
            }
            source => CreateRecordError::Database {
                table: self.table.name().to_string(),
                source,
            },
        }
        .into()
    }
}

impl<E, A> Clone for EntityRepository<E, A>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
{
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            table: self.table.clone(),
            primary_key: self.primary_key,
            _active_model: PhantomData,
        }
    }
}

impl<E, A> std::fmt::Debug for EntityRepository<E, A>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRepository")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Turn every value the active model holds into a `Set` so it is written.
fn mark_all_set<A: ActiveModelTrait>(mut active: A) -> A {
    for column in <A::Entity as EntityTrait>::Column::iter() {
        if let Some(value) = active.get(column).into_value() {
            active.set(column, value);
        }
    }
    active
}

#[async_trait]
impl<E, A> CrudRepository for EntityRepository<E, A>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<A> + Sync,
    A: ActiveModelTrait<Entity = E> + Send + Sync + 'static,
{
    type Entity = E;

    fn table(&self) -> &TableDescriptor {
        &self.table
    }

    async fn create(&self, to_create: ModelOf<E>) -> Result<ModelOf<E>, RepositoryError> {
        tracing::debug!(table = self.table.name(), "create");

        match self.table.key_strategy() {
            KeyStrategy::AutoIncrement => {
                let mut active = mark_all_set(to_create.into_active_model());
                active.not_set(self.primary_key);
                E::insert(active)
                    .exec_with_returning(&self.db)
                    .await
                    .map_err(|err| self.create_error(err))
            }
            KeyStrategy::Supplied => {
                let active = mark_all_set(to_create.clone().into_active_model());
                E::insert(active)
                    .exec_without_returning(&self.db)
                    .await
                    .map_err(|err| self.create_error(err))?;
                Ok(to_create)
            }
        }
    }

    async fn retrieve(&self, id: PrimaryKeyOf<E>) -> Result<Option<ModelOf<E>>, RepositoryError> {
        tracing::debug!(table = self.table.name(), "retrieve");
        Ok(E::find_by_id(id).one(&self.db).await?)
    }

    async fn retrieve_by<V>(
        &self,
        field: &str,
        value: V,
    ) -> Result<Option<ModelOf<E>>, RepositoryError>
    where
        V: Into<Value> + Send,
    {
        self.table.require_field(field)?;
        let column = E::Column::from_str(field).map_err(|_| RepositoryError::UnknownField {
            field: field.to_string(),
            table: self.table.name().to_string(),
        })?;
        self.retrieve_by_column(column, value).await
    }

    async fn retrieve_by_column<V>(
        &self,
        column: E::Column,
        value: V,
    ) -> Result<Option<ModelOf<E>>, RepositoryError>
    where
        V: Into<Value> + Send,
    {
        tracing::debug!(table = self.table.name(), field = column.as_str(), "retrieve_by");

        let mut rows = E::find()
            .filter(column.eq(value))
            .limit(UNIQUE_PROBE_LIMIT)
            .all(&self.db)
            .await?;
        if rows.len() > 1 {
            return Err(RepositoryError::TooManyRows {
                table: self.table.name().to_string(),
                field: column.as_str().to_string(),
            });
        }
        Ok(rows.pop())
    }

    async fn update_checked(
        &self,
        to_update: ModelOf<E>,
        check_exist: bool,
    ) -> Result<u64, RepositoryError> {
        tracing::debug!(table = self.table.name(), check_exist, "update");

        let key = ModelTrait::get(&to_update, self.primary_key);
        if check_exist && !self.exists(self.by_key(key.clone())).await? {
            tracing::warn!(table = self.table.name(), "record not found to update");
            return Err(UpdateRecordError::NotFound {
                table: self.table.name().to_string(),
            }
            .into());
        }

        let mut active = mark_all_set(to_update.into_active_model());
        active.not_set(self.primary_key);
        if !active.is_changed() {
            tracing::debug!(table = self.table.name(), "no columns to update");
            return Ok(0);
        }
        let result = E::update_many()
            .set(active)
            .filter(self.by_key(key))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_checked(
        &self,
        id: PrimaryKeyOf<E>,
        check_exist: bool,
    ) -> Result<u64, RepositoryError> {
        tracing::debug!(table = self.table.name(), check_exist, "delete");

        let by_key = self.by_key(self.key_value(id)?);
        if check_exist && !self.exists(by_key.clone()).await? {
            tracing::warn!(table = self.table.name(), "record not found to delete");
            return Err(DeleteRecordError::NotFound {
                table: self.table.name().to_string(),
            }
            .into());
        }

        let result = E::delete_many().filter(by_key).exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    async fn delete_many_checked(
        &self,
        ids: Vec<PrimaryKeyOf<E>>,
        check_exist: bool,
    ) -> Result<u64, RepositoryError> {
        tracing::debug!(
            table = self.table.name(),
            count = ids.len(),
            check_exist,
            "delete_many"
        );

        let keys = ids
            .into_iter()
            .map(|id| self.key_value(id))
            .collect::<Result<Vec<_>, _>>()?;
        let by_keys = Condition::all().add(self.primary_key.is_in(keys.iter().cloned()));

        if check_exist && (keys.is_empty() || !self.exists(by_keys.clone()).await?) {
            tracing::warn!(table = self.table.name(), "records not found to delete");
            return Err(DeleteRecordError::NoneFound {
                table: self.table.name().to_string(),
            }
            .into());
        }
        if keys.is_empty() {
            return Ok(0);
        }

        let result = E::delete_many().filter(by_keys).exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    async fn count(&self, conditions: Condition) -> Result<u64, RepositoryError> {
        tracing::debug!(table = self.table.name(), "count");
        let query = E::find().filter(conditions);
        Ok(PaginatorTrait::count(query, &self.db).await?)
    }

    async fn exists(&self, conditions: Condition) -> Result<bool, RepositoryError> {
        tracing::debug!(table = self.table.name(), "exists");
        let found = E::find()
            .select_only()
            .column(self.primary_key)
            .filter(conditions)
            .into_tuple::<PrimaryKeyOf<E>>()
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn list(&self, conditions: Condition) -> Result<Vec<ModelOf<E>>, RepositoryError> {
        tracing::debug!(table = self.table.name(), "list");
        Ok(E::find().filter(conditions).all(&self.db).await?)
    }
}
