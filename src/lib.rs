//! Generic CRUD repositories over Sea-ORM entities.
//!
//! [`CrudRepository`] declares create, retrieve, update, delete, count, exists and list.
//! [`EntityRepository`] implements it for any entity with a single primary key. It picks
//! auto-increment or caller-supplied keys from the entity definition and reports
//! failures as [`RepositoryError`].
//!
//! ```rust,ignore
//! use crud_repository::{CrudRepository, EntityRepository, all_of};
//!
//! let notes = EntityRepository::<note::Entity, note::ActiveModel>::new(db)?;
//! let note = notes.create(draft).await?;
//! notes.update_checked(note::Model { title: "edited".into(), ..note }, true).await?;
//! let open = notes.count(all_of([note::Column::Archived.eq(false)])).await?;
//! ```

pub mod core;
pub mod errors;
pub mod filtering;
pub mod table;

pub use crate::core::{CrudRepository, EntityRepository, ModelOf, PrimaryKeyOf, all_of};
pub use errors::{ApiError, CreateRecordError, DeleteRecordError, RepositoryError, UpdateRecordError};
pub use filtering::{conditions_from_filter, filter_conditions, parse_filter};
pub use table::{KeyStrategy, TableDescriptor};
