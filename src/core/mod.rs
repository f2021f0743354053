// Repository interface and its Sea-ORM implementation

pub mod entity_repository;
pub mod repository;

pub use entity_repository::EntityRepository;
pub use repository::{CrudRepository, ModelOf, PrimaryKeyOf, all_of};
