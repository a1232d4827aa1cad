//! Message store: canned reply texts kept in a `Messages` table.
//!
//! The table is owned outside this service; it is only ever read. Rows have an
//! `Id` (UUID as hyphenated TEXT or as a 16-byte BLOB) and a nullable `Text`. A nil,
//! NULL, or malformed id means the row does not count as a stored message.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, TypeInfo, ValueRef};
use uuid::Uuid;

const FIRST_MESSAGE_SQL: &str = "SELECT Id, Text FROM Messages LIMIT 1";

/// A stored reply message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: Uuid,
    pub text: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("message query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Source of the stored reply message.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// The first stored message, or None when the table is empty or the row has no valid id.
    async fn first_message(&self) -> Result<Option<StoredMessage>, StoreError>;
}

/// `MessageStore` over an sqlx SQLite pool.
#[derive(Clone)]
pub struct SqlMessageStore {
    pool: SqlitePool,
}

impl SqlMessageStore {
    /// Connect to the database at `url` (sqlx SQLite URL, e.g. `sqlite://messages.db`).
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(url)
            .await
            .context("connecting to message database")?;
        log::info!("connected to message database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
        log::info!("message database closed");
    }
}

#[async_trait]
impl MessageStore for SqlMessageStore {
    async fn first_message(&self) -> Result<Option<StoredMessage>, StoreError> {
        // Connection goes back to the pool when `conn` drops, including on error.
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(FIRST_MESSAGE_SQL)
            .fetch_optional(&mut *conn)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let Some(id) = decode_id(&row)? else {
            return Ok(None);
        };
        let text: Option<String> = row.try_get("Text")?;
        Ok(Some(StoredMessage { id, text }))
    }
}

/// Decode `Id` by the storage class of the value: TEXT is parsed, BLOB is read as raw
/// bytes, anything else (NULL, INTEGER, REAL) is absent.
fn decode_id(row: &SqliteRow) -> Result<Option<Uuid>, sqlx::Error> {
    let value = row.try_get_raw("Id")?;
    if value.is_null() {
        return Ok(None);
    }
    let storage = value.type_info().name().to_string();
    let id = match storage.as_str() {
        "TEXT" => {
            let raw: String = row.try_get("Id")?;
            parse_id(Some(raw.as_str()))
        }
        "BLOB" => {
            let raw: Vec<u8> = row.try_get("Id")?;
            id_from_bytes(&raw)
        }
        other => {
            log::debug!("stored message id has unsupported type {}", other);
            None
        }
    };
    Ok(id)
}

/// Nil and unparseable ids are treated as absent.
fn parse_id(raw: Option<&str>) -> Option<Uuid> {
    let raw = raw?.trim();
    match Uuid::parse_str(raw) {
        Ok(id) if !id.is_nil() => Some(id),
        Ok(_) => None,
        Err(e) => {
            log::debug!("stored message id {:?} is not a uuid: {}", raw, e);
            None
        }
    }
}

fn id_from_bytes(raw: &[u8]) -> Option<Uuid> {
    match Uuid::from_slice(raw) {
        Ok(id) if !id.is_nil() => Some(id),
        Ok(_) => None,
        Err(e) => {
            log::debug!("stored message id blob is not a uuid: {}", e);
            None
        }
    }
}
