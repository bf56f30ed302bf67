/*!
 * Translation persistence.
 *
 * Plain CRUD, search, export and tag attachment over the `translations`
 * and `translation_tag` tables. No caching and no business rules live
 * here; the UNIQUE(key, locale) constraint is the only guard against
 * duplicates, and its violation surfaces as `StoreError::UniqueViolation`.
 *
 * Every listing is ordered by id so that consecutive pages are stable.
 */

use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::models::{
    now_timestamp, NewTranslation, Page, PageRequest, TagRecord, TranslationChanges,
    TranslationRecord, TranslationWithTags,
};
use crate::errors::{StoreError, StoreResult};

const TRANSLATION_COLUMNS: &str = "id, key, value, locale, created_at, updated_at";

/// Upper bound on ids per `IN (...)` list when eager-loading tags
const EAGER_LOAD_BATCH: usize = 500;

/// Tag ids added and removed by a sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncChanges {
    pub attached: Vec<i64>,
    pub detached: Vec<i64>,
}

/// WHERE clause fragments with their positional parameters
#[derive(Debug, Default)]
struct Filter {
    clauses: Vec<&'static str>,
    params: Vec<Value>,
}

impl Filter {
    fn push(mut self, clause: &'static str, param: impl Into<Value>) -> Self {
        self.clauses.push(clause);
        self.params.push(param.into());
        self
    }

    fn locale(self, locale: Option<&str>) -> Self {
        match locale {
            Some(locale) => self.push("locale = ?", locale.to_string()),
            None => self,
        }
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// Wrap a fragment in wildcards, escaping LIKE metacharacters
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Translation store operations
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslationStore;

impl TranslationStore {
    /// Insert a translation row
    pub fn create(conn: &Connection, new: &NewTranslation) -> StoreResult<TranslationRecord> {
        let now = now_timestamp();
        conn.execute(
            r#"
            INSERT INTO translations (key, value, locale, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
            params![new.key, new.value, new.locale, now],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Inserted translation {} ({} / {})", id, new.key, new.locale);

        Ok(TranslationRecord {
            id,
            key: new.key.clone(),
            value: new.value.clone(),
            locale: new.locale.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Find a translation by id
    pub fn find(conn: &Connection, id: i64) -> StoreResult<Option<TranslationRecord>> {
        let record = conn
            .query_row(
                &format!("SELECT {} FROM translations WHERE id = ?1", TRANSLATION_COLUMNS),
                [id],
                TranslationRecord::from_row,
            )
            .optional()?;

        Ok(record)
    }

    /// Find a translation by id with its tags loaded
    pub fn find_with_tags(conn: &Connection, id: i64) -> StoreResult<Option<TranslationWithTags>> {
        match Self::find(conn, id)? {
            Some(record) => Ok(Self::with_tags(conn, vec![record])?.pop()),
            None => Ok(None),
        }
    }

    /// Apply a partial update by id
    pub fn update(
        conn: &Connection,
        id: i64,
        changes: &TranslationChanges,
    ) -> StoreResult<TranslationRecord> {
        let updated = conn.execute(
            r#"
            UPDATE translations
            SET key = COALESCE(?1, key),
                value = COALESCE(?2, value),
                locale = COALESCE(?3, locale),
                updated_at = ?4
            WHERE id = ?5
            "#,
            params![changes.key, changes.value, changes.locale, now_timestamp(), id],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound {
                entity: "Translation",
                id,
            });
        }

        Self::find(conn, id)?.ok_or(StoreError::NotFound {
            entity: "Translation",
            id,
        })
    }

    /// Delete by id; join rows go with it through ON DELETE CASCADE
    pub fn delete(conn: &Connection, id: i64) -> StoreResult<bool> {
        let deleted = conn.execute("DELETE FROM translations WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    pub fn exists_by_key_and_locale(conn: &Connection, key: &str, locale: &str) -> StoreResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM translations WHERE key = ?1 AND locale = ?2)",
            params![key, locale],
            |row| row.get(0),
        )?;

        Ok(exists)
    }

    /// Number of translations
    pub fn count(conn: &Connection) -> StoreResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?)
    }

    /// Page through all translations regardless of locale
    pub fn paginate(conn: &Connection, page: PageRequest) -> StoreResult<Page<TranslationWithTags>> {
        Self::paginate_filtered(conn, Filter::default(), page)
    }

    /// Page through the translations of one locale
    pub fn get_by_locale(
        conn: &Connection,
        locale: &str,
        page: PageRequest,
    ) -> StoreResult<Page<TranslationWithTags>> {
        Self::paginate_filtered(conn, Filter::default().locale(Some(locale)), page)
    }

    /// Translations with at least one tag whose name contains `fragment`
    pub fn search_by_tag(
        conn: &Connection,
        fragment: &str,
        locale: Option<&str>,
        page: PageRequest,
    ) -> StoreResult<Page<TranslationWithTags>> {
        let filter = Filter::default()
            .push(
                r#"EXISTS (
                    SELECT 1 FROM translation_tag tt
                    JOIN tags tg ON tg.id = tt.tag_id
                    WHERE tt.translation_id = translations.id
                      AND tg.name LIKE ? ESCAPE '\'
                )"#,
                like_pattern(fragment),
            )
            .locale(locale);

        Self::paginate_filtered(conn, filter, page)
    }

    /// Translations whose key contains `fragment`
    pub fn search_by_key(
        conn: &Connection,
        fragment: &str,
        locale: Option<&str>,
        page: PageRequest,
    ) -> StoreResult<Page<TranslationWithTags>> {
        let filter = Filter::default()
            .push(r"key LIKE ? ESCAPE '\'", like_pattern(fragment))
            .locale(locale);

        Self::paginate_filtered(conn, filter, page)
    }

    /// Translations whose value contains `fragment`
    pub fn search_by_content(
        conn: &Connection,
        fragment: &str,
        locale: Option<&str>,
        page: PageRequest,
    ) -> StoreResult<Page<TranslationWithTags>> {
        let filter = Filter::default()
            .push(r"value LIKE ? ESCAPE '\'", like_pattern(fragment))
            .locale(locale);

        Self::paginate_filtered(conn, filter, page)
    }

    /// Flat key -> value mapping for one locale, ordered by key
    pub fn export_by_locale(conn: &Connection, locale: &str) -> StoreResult<BTreeMap<String, String>> {
        let mut stmt =
            conn.prepare("SELECT key, value FROM translations WHERE locale = ?1 ORDER BY key")?;
        let mut rows = stmt.query([locale])?;

        let mut result = BTreeMap::new();
        while let Some(row) = rows.next()? {
            result.insert(row.get(0)?, row.get(1)?);
        }

        debug!("Exported {} keys for locale {}", result.len(), locale);
        Ok(result)
    }

    /// Add tags to a translation, keeping the ones already attached
    pub fn attach_tags(conn: &Connection, id: i64, tag_ids: &[i64]) -> StoreResult<()> {
        Self::ensure_exists(conn, id)?;
        Self::insert_links(conn, id, tag_ids)?;
        Ok(())
    }

    /// Replace the tag set of a translation with exactly `tag_ids`
    pub fn sync_tags(conn: &Connection, id: i64, tag_ids: &[i64]) -> StoreResult<SyncChanges> {
        Self::ensure_exists(conn, id)?;

        let current: HashSet<i64> = Self::tag_ids_for(conn, id)?.into_iter().collect();
        let wanted: HashSet<i64> = tag_ids.iter().copied().collect();

        let mut detached: Vec<i64> = current.difference(&wanted).copied().collect();
        detached.sort_unstable();
        for tag_id in &detached {
            conn.execute(
                "DELETE FROM translation_tag WHERE translation_id = ?1 AND tag_id = ?2",
                params![id, tag_id],
            )?;
        }

        let mut attached: Vec<i64> = wanted.difference(&current).copied().collect();
        attached.sort_unstable();
        Self::insert_links(conn, id, &attached)?;

        debug!(
            "Synced tags for translation {}: +{:?} -{:?}",
            id, attached, detached
        );
        Ok(SyncChanges { attached, detached })
    }

    /// Ids of tags attached to a translation
    pub fn tag_ids_for(conn: &Connection, id: i64) -> StoreResult<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT tag_id FROM translation_tag WHERE translation_id = ?1 ORDER BY tag_id",
        )?;
        let ids = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Eager-load tags for a batch of translations, keeping input order
    pub fn with_tags(
        conn: &Connection,
        translations: Vec<TranslationRecord>,
    ) -> StoreResult<Vec<TranslationWithTags>> {
        let mut tags_by_translation: HashMap<i64, Vec<TagRecord>> = HashMap::new();

        let ids: Vec<i64> = translations.iter().map(|t| t.id).collect();
        for batch in ids.chunks(EAGER_LOAD_BATCH) {
            let placeholders = vec!["?"; batch.len()].join(", ");
            let sql = format!(
                r#"
                SELECT tt.translation_id, t.id, t.name, t.created_at, t.updated_at
                FROM translation_tag tt
                JOIN tags t ON t.id = tt.tag_id
                WHERE tt.translation_id IN ({})
                ORDER BY t.name
                "#,
                placeholders
            );

            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(batch.iter()))?;
            while let Some(row) = rows.next()? {
                let translation_id: i64 = row.get(0)?;
                let tag = TagRecord {
                    id: row.get(1)?,
                    name: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                };
                tags_by_translation.entry(translation_id).or_default().push(tag);
            }
        }

        Ok(translations
            .into_iter()
            .map(|translation| {
                let tags = tags_by_translation.remove(&translation.id).unwrap_or_default();
                TranslationWithTags { translation, tags }
            })
            .collect())
    }

    fn ensure_exists(conn: &Connection, id: i64) -> StoreResult<()> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM translations WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?;

        if exists {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "Translation",
                id,
            })
        }
    }

    fn insert_links(conn: &Connection, id: i64, tag_ids: &[i64]) -> StoreResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        let now = now_timestamp();
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT OR IGNORE INTO translation_tag (translation_id, tag_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            "#,
        )?;
        for tag_id in tag_ids {
            stmt.execute(params![id, tag_id, now])?;
        }
        Ok(())
    }

    fn paginate_filtered(
        conn: &Connection,
        filter: Filter,
        page: PageRequest,
    ) -> StoreResult<Page<TranslationWithTags>> {
        let where_sql = filter.where_sql();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM translations{}", where_sql),
            params_from_iter(filter.params.iter()),
            |row| row.get(0),
        )?;

        let mut params = filter.params;
        params.push(Value::Integer(page.per_page() as i64));
        params.push(Value::Integer(page.sql_offset()));

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM translations{} ORDER BY id LIMIT ? OFFSET ?",
            TRANSLATION_COLUMNS, where_sql
        ))?;
        let records = stmt
            .query_map(params_from_iter(params.iter()), TranslationRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let data = Self::with_tags(conn, records)?;
        Ok(Page::new(page, total, data))
    }
}
