use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::OptionalExtension;
use tokio::sync::Mutex;
use tokio_rusqlite::Connection;

use crate::error::{AppError, AppResult, StoreError};

/// String key-value persistence for series buffers.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be read.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// # Errors
    ///
    /// Returns an error when the backing store cannot be written.
    async fn set(&self, key: &str, value: String) -> AppResult<()>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be written.
    async fn remove(&self, key: &str) -> AppResult<()>;
}

#[async_trait]
impl<T> KvStore for Arc<T>
where
    T: KvStore + ?Sized,
{
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        (**self).remove(key).await
    }
}

/// Process-local store; contents are lost on exit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.entries.lock().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// SQLite-backed store, one row per key.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened and initialized.
    pub async fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                AppError::store(StoreError::CreateDir {
                    path: parent.display().to_string(),
                    source: err,
                })
            })?;
        }
        let conn = Connection::open(path.to_path_buf())
            .await
            .map_err(|err| sqlite_error("open sqlite store", err))?;
        Self::initialize(conn).await
    }

    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be initialized.
    pub async fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| sqlite_error("open sqlite store", err))?;
        Self::initialize(conn).await
    }

    async fn initialize(conn: Connection) -> AppResult<Self> {
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS series (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )?;
            Ok(())
        })
        .await
        .map_err(|err| sqlite_error("initialize sqlite store", err))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let key = key.to_owned();
        self.conn
            .call(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM series WHERE key = ?1",
                        rusqlite::params![key],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await
            .map_err(|err| sqlite_error("read series", err))
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let key = key.to_owned();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO series (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    rusqlite::params![key, value],
                )?;
                Ok(())
            })
            .await
            .map_err(|err| sqlite_error("write series", err))
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let key = key.to_owned();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM series WHERE key = ?1", rusqlite::params![key])?;
                Ok(())
            })
            .await
            .map_err(|err| sqlite_error("remove series", err))
    }
}

fn sqlite_error(context: &'static str, source: tokio_rusqlite::Error) -> AppError {
    AppError::store(StoreError::Sqlite { context, source })
}
