//! SQLite-backed token store using sqlx.
//!
//! Schema: `tokens(location_id, access_token, refresh_token, expires_in, issued_at, updated_at)`
//! with primary key `location_id`.
//!
//! Upserts are a single `INSERT .. ON CONFLICT .. DO UPDATE .. RETURNING`
//! statement, so the at-most-one-row-per-location invariant holds under
//! concurrent writers.

use async_trait::async_trait;
use hlbridge_types::{TokenRecord, TokenStore, TokenUpdate, traits::Result};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;

type TokenRow = (String, String, String, i64, i64);

const SELECT_COLUMNS: &str = "location_id, access_token, refresh_token, expires_in, issued_at";

fn row_to_record(row: TokenRow) -> TokenRecord {
    let (location_id, access_token, refresh_token, expires_in, issued_at) = row;
    TokenRecord {
        location_id,
        access_token,
        refresh_token,
        expires_in,
        issued_at,
    }
}

/// A persistent [`TokenStore`] backed by `SQLite`.
pub struct SqliteTokenStore {
    /// Connection pool to the `SQLite` database.
    pool: SqlitePool,
}

impl SqliteTokenStore {
    /// Connects to a `SQLite` database (e.g. `"sqlite:./tokens.db"` or `"sqlite::memory:"`).
    ///
    /// Automatically creates the database file if it does not exist.
    /// Runs migrations to create the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`sqlx::Error`] if the connection or table creation fails.
    pub async fn new(database_url: &str) -> std::result::Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `:memory:` opens its own private database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;
        Self::migrate(&pool).await?;
        tracing::debug!(url = database_url, "token store ready");
        Ok(Self { pool })
    }

    /// Creates the `tokens` table if it does not exist.
    async fn migrate(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tokens (
                location_id   TEXT    NOT NULL PRIMARY KEY,
                access_token  TEXT    NOT NULL,
                refresh_token TEXT    NOT NULL,
                expires_in    INTEGER NOT NULL,
                issued_at     INTEGER NOT NULL,
                updated_at    INTEGER NOT NULL DEFAULT (unixepoch())
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn upsert(&self, location_id: &str, update: &TokenUpdate) -> Result<TokenRecord> {
        let sql = format!(
            "INSERT INTO tokens (location_id, access_token, refresh_token, expires_in, issued_at)
             VALUES (?1, ?2, COALESCE(?3, ''), ?4, ?5)
             ON CONFLICT(location_id) DO UPDATE SET
                 access_token  = excluded.access_token,
                 refresh_token = CASE WHEN ?3 IS NULL THEN tokens.refresh_token ELSE excluded.refresh_token END,
                 expires_in    = excluded.expires_in,
                 issued_at     = CASE WHEN ?6 THEN excluded.issued_at ELSE tokens.issued_at END,
                 updated_at    = unixepoch()
             RETURNING {SELECT_COLUMNS}"
        );
        let row: TokenRow = sqlx::query_as(&sql)
            .bind(location_id)
            .bind(&update.access_token)
            .bind(&update.refresh_token)
            .bind(update.expires_in)
            .bind(update.issued_at)
            .bind(update.reset_issued_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row_to_record(row))
    }

    async fn get_by_location(&self, location_id: &str) -> Result<Option<TokenRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM tokens WHERE location_id = ?");
        let row: Option<TokenRow> = sqlx::query_as(&sql)
            .bind(location_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_record))
    }

    async fn list_locations(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT location_id FROM tokens ORDER BY location_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
