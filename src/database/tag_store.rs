/*!
 * Tag persistence.
 *
 * Tags are created lazily on first reference and looked up by name.
 * All functions take a borrowed connection so they compose inside a
 * caller-owned transaction.
 */

use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{now_timestamp, TagRecord};
use crate::errors::StoreResult;

const TAG_COLUMNS: &str = "id, name, created_at, updated_at";

/// Tag store operations
#[derive(Debug, Clone, Copy, Default)]
pub struct TagStore;

impl TagStore {
    /// Return the tag with this name, inserting it first if missing
    pub fn find_or_create(conn: &Connection, name: &str) -> StoreResult<TagRecord> {
        let now = now_timestamp();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO tags (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![name, now],
        )?;

        if inserted > 0 {
            debug!("Created tag '{}'", name);
        }

        let tag = conn.query_row(
            &format!("SELECT {} FROM tags WHERE name = ?1", TAG_COLUMNS),
            [name],
            TagRecord::from_row,
        )?;

        Ok(tag)
    }

    /// Resolve names to ids, preserving order and duplicates
    pub fn ids_from_names<S: AsRef<str>>(conn: &Connection, names: &[S]) -> StoreResult<Vec<i64>> {
        names
            .iter()
            .map(|name| Self::find_or_create(conn, name.as_ref()).map(|tag| tag.id))
            .collect()
    }

    /// Look up a tag by exact name
    pub fn find_by_name(conn: &Connection, name: &str) -> StoreResult<Option<TagRecord>> {
        let tag = conn
            .query_row(
                &format!("SELECT {} FROM tags WHERE name = ?1", TAG_COLUMNS),
                [name],
                TagRecord::from_row,
            )
            .optional()?;

        Ok(tag)
    }

    /// Tags attached to a translation, ordered by name
    pub fn tags_for_translation(conn: &Connection, translation_id: i64) -> StoreResult<Vec<TagRecord>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.name, t.created_at, t.updated_at
            FROM tags t
            JOIN translation_tag tt ON tt.tag_id = t.id
            WHERE tt.translation_id = ?1
            ORDER BY t.name
            "#,
        )?;

        let tags = stmt
            .query_map([translation_id], TagRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    /// Number of tags
    pub fn count(conn: &Connection) -> StoreResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?)
    }
}
