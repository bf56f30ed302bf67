/*!
 * Database connection management.
 *
 * This module handles SQLite database connection creation, initialization,
 * and provides scoped units of work: plain execution and transactions that
 * commit on success and roll back on any error. Async variants run the work
 * on tokio's blocking pool via spawn_blocking.
 */

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::schema;
use crate::errors::StoreError;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "lingotag.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "lingotag";

/// Database connection wrapper with thread-safe access
#[derive(Clone)]
pub struct DatabaseConnection {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl DatabaseConnection {
    /// Create a new database connection at the default location
    pub fn new_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Create a new database connection at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }

        info!("Opening database at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");

        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a database operation with the connection
    ///
    /// Statements run in autocommit mode. Use `transaction` for
    /// multi-statement writes that must succeed or fail together.
    pub fn execute<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<StoreError>,
    {
        let conn = lock_connection(&self.connection)?;
        f(&conn)
    }

    /// Execute a database operation asynchronously using spawn_blocking
    pub async fn execute_async<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_connection(&conn)?;
            f(&conn)
        })
        .await
        .map_err(|e| E::from(StoreError::TaskJoin(e.to_string())))?
    }

    /// Run a unit of work inside a transaction
    ///
    /// The transaction is committed when `f` returns `Ok` and rolled back
    /// when it returns `Err`; the error is then handed back to the caller.
    pub fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut conn = lock_connection(&self.connection)?;
        run_in_transaction(&mut conn, f)
    }

    /// Run a unit of work inside a transaction on the blocking pool
    pub async fn transaction_async<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = lock_connection(&conn)?;
            run_in_transaction(&mut conn, f)
        })
        .await
        .map_err(|e| E::from(StoreError::TaskJoin(e.to_string())))?
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DatabaseStats, StoreError> {
        self.execute(|conn| {
            let translation_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;

            let tag_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;

            let link_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM translation_tag", [], |row| row.get(0))?;

            let mut stmt = conn.prepare("SELECT DISTINCT locale FROM translations ORDER BY locale")?;
            let locales = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;

            let file_size = if self.db_path.to_string_lossy() != ":memory:" {
                std::fs::metadata(&self.db_path)
                    .map(|m| m.len())
                    .unwrap_or(0)
            } else {
                0
            };

            Ok(DatabaseStats {
                translation_count,
                tag_count,
                link_count,
                locales,
                file_size_bytes: file_size,
            })
        })
    }
}

fn lock_connection(connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    connection
        .lock()
        .map_err(|e| StoreError::Lock(e.to_string()))
}

fn run_in_transaction<F, T, E>(conn: &mut Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<StoreError>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(StoreError::from)?;

    match f(&tx) {
        Ok(result) => {
            tx.commit().map_err(StoreError::from)?;
            Ok(result)
        }
        Err(error) => {
            debug!("Rolling back transaction");
            if let Err(rollback_error) = tx.rollback() {
                warn!("Transaction rollback failed: {}", rollback_error);
            }
            Err(error)
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseStats {
    /// Number of translations
    pub translation_count: i64,
    /// Number of tags
    pub tag_count: i64,
    /// Number of translation/tag links
    pub link_count: i64,
    /// Distinct locales present
    pub locales: Vec<String>,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Translations: {}, Tags: {}, Links: {}, Locales: [{}], Size: {} KB",
            self.translation_count,
            self.tag_count,
            self.link_count,
            self.locales.join(", "),
            self.file_size_bytes / 1024
        )
    }
}
