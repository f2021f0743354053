#![allow(dead_code)]

use crud_repository::EntityRepository;
use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::prelude::*;

pub mod account_entity;
pub mod note_entity;

pub type NoteRepository = EntityRepository<note_entity::Entity, note_entity::ActiveModel>;
pub type AccountRepository = EntityRepository<account_entity::Entity, account_entity::ActiveModel>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_target(false)
        .compact()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub async fn setup_note_repository() -> NoteRepository {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    NoteRepository::new(db).expect("notes has a single primary key")
}

pub async fn setup_account_repository() -> AccountRepository {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    AccountRepository::new(db).expect("accounts has a single primary key")
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateNoteTable), Box::new(CreateAccountTable)]
    }
}

pub struct CreateNoteTable;

impl MigrationName for CreateNoteTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_note_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateNoteTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(NoteTable)
            .if_not_exists()
            .col(
                ColumnDef::new(NoteColumn::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(NoteColumn::Title).string().not_null())
            .col(ColumnDef::new(NoteColumn::Body).text().null())
            .col(
                ColumnDef::new(NoteColumn::Priority)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(NoteColumn::Archived)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NoteTable).to_owned())
            .await?;
        Ok(())
    }
}

pub struct CreateAccountTable;

impl MigrationName for CreateAccountTable {
    fn name(&self) -> &'static str {
        "m20240101_000002_create_account_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateAccountTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(AccountTable)
            .if_not_exists()
            .col(
                ColumnDef::new(AccountColumn::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(AccountColumn::Email)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(AccountColumn::DisplayName).string().not_null())
            .col(
                ColumnDef::new(AccountColumn::Balance)
                    .big_integer()
                    .not_null()
                    .default(0),
            )
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountTable).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum NoteColumn {
    Id,
    Title,
    Body,
    Priority,
    Archived,
}

impl Iden for NoteColumn {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(
            s,
            "{}",
            match self {
                Self::Id => "id",
                Self::Title => "title",
                Self::Body => "body",
                Self::Priority => "priority",
                Self::Archived => "archived",
            }
        )
        .unwrap();
    }
}

#[derive(Debug)]
pub struct NoteTable;

impl Iden for NoteTable {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "notes").unwrap();
    }
}

#[derive(Debug)]
pub enum AccountColumn {
    Id,
    Email,
    DisplayName,
    Balance,
}

impl Iden for AccountColumn {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(
            s,
            "{}",
            match self {
                Self::Id => "id",
                Self::Email => "email",
                Self::DisplayName => "display_name",
                Self::Balance => "balance",
            }
        )
        .unwrap();
    }
}

#[derive(Debug)]
pub struct AccountTable;

impl Iden for AccountTable {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "accounts").unwrap();
    }
}
