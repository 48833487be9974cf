use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error, SqlitePool,
};
use thiserror::Error;

pub mod models;

const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to parse database URL: {0}")]
    UrlParse(String),
    #[error("Database error: {0}")]
    Sqlx(#[from] Error),
    #[error("Failed to apply schema: {0}")]
    Schema(#[source] Error),
}

/// Opens the SQLite store behind `database_url` and makes sure the schema exists.
///
/// The database file is created when missing. Connections run in WAL mode with
/// foreign keys enforced, so concurrent purchases queue on the write lock
/// (bounded by sqlx's busy timeout) instead of failing outright.
pub async fn init_db(database_url: &str, max_connections: u32) -> Result<SqlitePool, DatabaseError> {
    let options = connect_options(database_url)?;

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(DatabaseError::Sqlx)?;

    apply_schema(&pool).await?;

    log::info!("Connected to {}", database_url);
    Ok(pool)
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, DatabaseError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| DatabaseError::UrlParse(e.to_string()))?;

    Ok(options
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true))
}

/// Creates the `users`, `medicines` and `purchase_history` tables if they are missing.
pub async fn apply_schema(pool: &SqlitePool) -> Result<(), DatabaseError> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_err(DatabaseError::Schema)?;

    Ok(())
}
