use anyhow::Result;
use log::warn;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    Schema, Statement,
};

use crate::entities::{attachment, list, step, task};

/// Compiled schema version, stored in SQLite's `user_version` pragma.
///
/// Migration policy is destructive: a stored version that differs from this
/// one drops and recreates every table. Acceptable only while the schema is
/// pre-release.
const SCHEMA_VERSION: i32 = 3;

/// Local storage manager backed by a SQLite database
pub struct LocalStorage {
    pub conn: DatabaseConnection,
}

impl LocalStorage {
    /// Open (or create) the database at the given sqlx URL, e.g.
    /// `sqlite:///home/user/.local/share/daylist/daylist.db?mode=rwc`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        // Single connection: SQLite serializes writes anyway, and connection-scoped
        // pragmas (foreign_keys) must hold for every statement we run.
        options.max_connections(1).sqlx_logging(false);

        let conn = Database::connect(options).await?;
        conn.execute_unprepared("PRAGMA foreign_keys = ON").await?;

        let storage = LocalStorage { conn };
        storage.migrate().await?;
        Ok(storage)
    }

    /// Open a fresh in-memory database. Used by tests and `--ephemeral` runs.
    pub async fn new_in_memory() -> Result<Self> {
        Self::new("sqlite::memory:").await
    }

    /// Apply the destructive migration policy, then ensure the schema exists.
    async fn migrate(&self) -> Result<()> {
        let stored = self.user_version().await?;
        if stored != 0 && stored != SCHEMA_VERSION {
            warn!(
                "schema version {} does not match compiled version {}, wiping local database",
                stored, SCHEMA_VERSION
            );
            self.drop_schema().await?;
        }

        self.init_schema().await?;
        self.conn
            .execute_unprepared(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
            .await?;
        Ok(())
    }

    async fn user_version(&self) -> Result<i32> {
        let backend = self.conn.get_database_backend();
        let row = self
            .conn
            .query_one(Statement::from_string(backend, "PRAGMA user_version".to_owned()))
            .await?;
        match row {
            Some(row) => Ok(row.try_get_by_index::<i32>(0)?),
            None => Ok(0),
        }
    }

    /// Create all tables from the entity definitions
    async fn init_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        // Parents before children so foreign keys resolve
        let mut stmt = schema.create_table_from_entity(list::Entity);
        self.conn.execute(backend.build(stmt.if_not_exists())).await?;

        let mut stmt = schema.create_table_from_entity(task::Entity);
        self.conn.execute(backend.build(stmt.if_not_exists())).await?;

        let mut stmt = schema.create_table_from_entity(step::Entity);
        self.conn.execute(backend.build(stmt.if_not_exists())).await?;

        let mut stmt = schema.create_table_from_entity(attachment::Entity);
        self.conn.execute(backend.build(stmt.if_not_exists())).await?;

        Ok(())
    }

    /// Drop all tables, children first
    async fn drop_schema(&self) -> Result<()> {
        self.conn.execute_unprepared("DROP TABLE IF EXISTS attachments").await?;
        self.conn.execute_unprepared("DROP TABLE IF EXISTS steps").await?;
        self.conn.execute_unprepared("DROP TABLE IF EXISTS tasks").await?;
        self.conn.execute_unprepared("DROP TABLE IF EXISTS lists").await?;
        Ok(())
    }

    /// Check if the database has any lists or tasks
    pub async fn has_data(&self) -> Result<bool> {
        let lists = list::Entity::find().count(&self.conn).await?;
        if lists > 0 {
            return Ok(true);
        }
        let tasks = task::Entity::find().count(&self.conn).await?;
        Ok(tasks > 0)
    }

    /// Delete every row. Tasks go first so unfiled tasks (which no list
    /// cascade reaches) are removed too; steps and attachments cascade.
    pub async fn clear_all_data(&self) -> Result<()> {
        task::Entity::delete_many().exec(&self.conn).await?;
        list::Entity::delete_many().exec(&self.conn).await?;
        Ok(())
    }
}
