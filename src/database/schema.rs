/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for the translation tables and
 * records its version. Databases from a newer or unknown version are
 * rejected rather than opened.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Per-connection settings; cascading deletes depend on foreign_keys
    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .context("Failed to enable foreign keys")?;

    let current_version = get_schema_version(conn)?;

    match current_version {
        0 => {
            info!("Initializing database schema v{}", SCHEMA_VERSION);
            create_all_tables(conn)?;
            set_schema_version(conn, SCHEMA_VERSION)?;
        }
        SCHEMA_VERSION => debug!("Database schema is up to date (v{})", current_version),
        other => {
            return Err(anyhow::anyhow!(
                "Unsupported database schema v{} (this build supports v{})",
                other,
                SCHEMA_VERSION
            ));
        }
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    // An empty table means creation was interrupted before the version was written
    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .context("Failed to read schema version")?;

    Ok(version.unwrap_or(0))
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    // WAL for file databases; SQLite keeps "memory" for in-memory ones
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .context("Failed to set journal mode")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL CHECK (length(key) <= 255),
            value TEXT NOT NULL,
            locale TEXT NOT NULL CHECK (length(locale) <= 10),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(key, locale)
        );

        CREATE INDEX IF NOT EXISTS idx_translations_key ON translations(key);
        CREATE INDEX IF NOT EXISTS idx_translations_locale ON translations(locale);
        "#,
    )
    .context("Failed to create translations table")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .context("Failed to create tags table")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS translation_tag (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            translation_id INTEGER NOT NULL REFERENCES translations(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(translation_id, tag_id)
        );

        CREATE INDEX IF NOT EXISTS idx_translation_tag_translation ON translation_tag(translation_id);
        CREATE INDEX IF NOT EXISTS idx_translation_tag_tag ON translation_tag(tag_id);
        "#,
    )
    .context("Failed to create translation_tag table")?;

    info!("Database schema created successfully");
    Ok(())
}
