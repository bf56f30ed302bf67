/*!
 * Translation service.
 *
 * Orchestrates the translation store, the tag store and the read cache.
 * This is where the rules storage does not enforce live: a translation
 * always carries at least one tag, and a duplicate (key, locale) pair is
 * reported as `ServiceError::Duplicate` whether the pre-check or the
 * UNIQUE constraint catches it.
 *
 * Every write runs as one transaction on the blocking pool. Cache entries
 * for the affected locale are forgotten after the transaction commits.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, error, info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::cache::{CacheKey, CacheOperation, CacheStore, CacheTtls, CachedValue, TranslationCache};
use crate::database::{
    DatabaseConnection, NewTranslation, Page, PageRequest, TagStore, TranslationChanges,
    TranslationRecord, TranslationStore, TranslationWithTags,
};
use crate::errors::{ServiceError, ServiceResult, StoreError, StoreResult};

/// Maximum key length in characters
pub const MAX_KEY_LENGTH: usize = 255;

/// Maximum locale length in characters
pub const MAX_LOCALE_LENGTH: usize = 10;

/// Maximum tag name length in characters
pub const MAX_TAG_LENGTH: usize = 255;

/// Service construction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Locale exported when the caller names none
    pub default_locale: String,
    /// Cache lifetime per query kind
    pub ttls: CacheTtls,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            ttls: CacheTtls::default(),
        }
    }
}

/// Input for creating a translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTranslation {
    pub key: String,
    pub value: String,
    pub locale: String,
    pub tags: Vec<String>,
}

/// Input for updating a translation's value and tag set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTranslation {
    pub value: String,
    pub tags: Vec<String>,
}

/// Translation service with cache-backed reads
#[derive(Clone)]
pub struct TranslationService {
    db: DatabaseConnection,
    cache: Arc<dyn CacheStore>,
    options: ServiceOptions,
}

impl std::fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationService")
            .field("db", &self.db)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl TranslationService {
    /// Create a service over the given database and cache
    pub fn new(db: DatabaseConnection, cache: Arc<dyn CacheStore>, options: ServiceOptions) -> Self {
        Self { db, cache, options }
    }

    /// Create a service whose reads always go to the database
    pub fn uncached(db: DatabaseConnection, options: ServiceOptions) -> Self {
        Self::new(db, Arc::new(TranslationCache::new(false)), options)
    }

    /// Locale exported when the caller names none
    pub fn default_locale(&self) -> &str {
        &self.options.default_locale
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Create a translation with its tags
    pub async fn create(&self, input: CreateTranslation) -> ServiceResult<TranslationWithTags> {
        let CreateTranslation {
            key,
            value,
            locale,
            tags,
        } = input;

        validate_key(&key)
            .and_then(|()| validate_value(&value))
            .and_then(|()| validate_locale_code(&locale))
            .and_then(|()| validate_tag_names(&tags))
            .inspect_err(|e| log_failure(&format!("create translation '{}' ({})", key, locale), e))?;

        let (log_key, log_locale) = (key.clone(), locale.clone());

        let result = self
            .db
            .transaction_async(move |tx| -> ServiceResult<TranslationWithTags> {
                if TranslationStore::exists_by_key_and_locale(tx, &key, &locale)? {
                    return Err(ServiceError::Duplicate { key, locale });
                }
                if tags.is_empty() {
                    return Err(missing_tags());
                }

                let record = insert_translation(tx, &key, value, &locale)?;

                let tag_ids = TagStore::ids_from_names(tx, &tags)?;
                TranslationStore::attach_tags(tx, record.id, &tag_ids)?;

                load_one(tx, record.id)
            })
            .await;

        match result {
            Ok(translation) => {
                self.invalidate(&log_locale);
                info!(
                    "Created translation {} ('{}' / {})",
                    translation.translation.id, log_key, log_locale
                );
                Ok(translation)
            }
            Err(e) => {
                log_failure(
                    &format!("create translation '{}' ({})", log_key, log_locale),
                    &e,
                );
                Err(e)
            }
        }
    }

    /// Replace the value and the full tag set of a translation
    pub async fn update(&self, id: i64, input: UpdateTranslation) -> ServiceResult<TranslationWithTags> {
        let UpdateTranslation { value, tags } = input;

        validate_value(&value)
            .and_then(|()| validate_tag_names(&tags))
            .inspect_err(|e| log_failure(&format!("update translation {}", id), e))?;

        let result = self
            .db
            .transaction_async(move |tx| -> ServiceResult<TranslationWithTags> {
                if TranslationStore::find(tx, id)?.is_none() {
                    return Err(ServiceError::NotFound { id });
                }
                if tags.is_empty() {
                    return Err(missing_tags());
                }

                TranslationStore::update(tx, id, &TranslationChanges::value(value))?;

                let tag_ids = TagStore::ids_from_names(tx, &tags)?;
                TranslationStore::sync_tags(tx, id, &tag_ids)?;

                load_one(tx, id)
            })
            .await;

        match result {
            Ok(translation) => {
                self.invalidate(&translation.translation.locale);
                info!(
                    "Updated translation {} ('{}' / {})",
                    id, translation.translation.key, translation.translation.locale
                );
                Ok(translation)
            }
            Err(e) => {
                log_failure(&format!("update translation {}", id), &e);
                Err(e)
            }
        }
    }

    /// Delete a translation and its tag links
    pub async fn delete(&self, id: i64) -> ServiceResult<bool> {
        let result = self
            .db
            .transaction_async(move |tx| -> ServiceResult<(String, bool)> {
                let record = TranslationStore::find(tx, id)?.ok_or(ServiceError::NotFound { id })?;
                let deleted = TranslationStore::delete(tx, id)?;
                Ok((record.locale, deleted))
            })
            .await;

        match result {
            Ok((locale, deleted)) => {
                self.invalidate(&locale);
                info!("Deleted translation {} ({})", id, locale);
                Ok(deleted)
            }
            Err(e) => {
                log_failure(&format!("delete translation {}", id), &e);
                Err(e)
            }
        }
    }

    /// Fetch one translation with its tags; never cached
    pub async fn get(&self, id: i64) -> ServiceResult<TranslationWithTags> {
        let result = self
            .db
            .execute_async(move |conn| -> ServiceResult<TranslationWithTags> {
                TranslationStore::find_with_tags(conn, id)?.ok_or(ServiceError::NotFound { id })
            })
            .await;

        result.inspect_err(|e| log_failure(&format!("get translation {}", id), e))
    }

    /// List translations of one locale, or of all locales when `locale` is `None`
    pub async fn list(
        &self,
        locale: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Page<TranslationWithTags>> {
        let key = CacheKey::list(locale, page);
        let locale = locale.map(str::to_string);

        self.remember_page(key, move |conn| match locale.as_deref() {
            Some(locale) => TranslationStore::get_by_locale(conn, locale, page),
            None => TranslationStore::paginate(conn, page),
        })
        .await
    }

    /// Translations having a tag whose name contains `tag`
    pub async fn search_by_tag(
        &self,
        tag: &str,
        locale: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Page<TranslationWithTags>> {
        let key = CacheKey::search(CacheOperation::SearchByTag, tag, locale, page);
        let (tag, locale) = (tag.to_string(), locale.map(str::to_string));

        self.remember_page(key, move |conn| {
            TranslationStore::search_by_tag(conn, &tag, locale.as_deref(), page)
        })
        .await
    }

    /// Translations whose key contains `key`
    pub async fn search_by_key(
        &self,
        key: &str,
        locale: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Page<TranslationWithTags>> {
        let cache_key = CacheKey::search(CacheOperation::SearchByKey, key, locale, page);
        let (key, locale) = (key.to_string(), locale.map(str::to_string));

        self.remember_page(cache_key, move |conn| {
            TranslationStore::search_by_key(conn, &key, locale.as_deref(), page)
        })
        .await
    }

    /// Translations whose value contains `content`
    pub async fn search_by_content(
        &self,
        content: &str,
        locale: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Page<TranslationWithTags>> {
        let key = CacheKey::search(CacheOperation::SearchByContent, content, locale, page);
        let (content, locale) = (content.to_string(), locale.map(str::to_string));

        self.remember_page(key, move |conn| {
            TranslationStore::search_by_content(conn, &content, locale.as_deref(), page)
        })
        .await
    }

    /// Flat key -> value export, for the default locale when none is given
    pub async fn export(&self, locale: Option<&str>) -> ServiceResult<BTreeMap<String, String>> {
        let locale = locale.unwrap_or(self.default_locale()).to_string();
        let key = CacheKey::export(&locale);

        if let Some(export) = self.cache.get(&key).and_then(CachedValue::into_export) {
            return Ok(export);
        }

        let load_locale = locale.clone();
        let export = self
            .db
            .execute_async(move |conn| TranslationStore::export_by_locale(conn, &load_locale))
            .await
            .map_err(ServiceError::from)
            .inspect_err(|e| log_failure(&format!("export locale {}", locale), e))?;

        self.cache.put(
            &key,
            CachedValue::Export(export.clone()),
            self.options.ttls.for_operation(CacheOperation::Export),
        );
        Ok(export)
    }

    /// Forget the cached export and unparameterized listings for a locale
    pub fn invalidate(&self, locale: &str) {
        let keys = [
            CacheKey::export(locale),
            CacheKey::list(Some(locale), PageRequest::default()),
            CacheKey::list(None, PageRequest::default()),
        ];

        for key in &keys {
            self.cache.forget(key);
        }
        debug!("Invalidated cache for locale {}", locale);
    }

    /// Drop every cached read
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn remember_page<F>(&self, key: CacheKey, load: F) -> ServiceResult<Page<TranslationWithTags>>
    where
        F: FnOnce(&Connection) -> StoreResult<Page<TranslationWithTags>> + Send + 'static,
    {
        if let Some(page) = self.cache.get(&key).and_then(CachedValue::into_page) {
            return Ok(page);
        }

        let page = self
            .db
            .execute_async(load)
            .await
            .map_err(ServiceError::from)
            .inspect_err(|e| log_failure(&format!("load {}", key.operation.namespace()), e))?;

        self.cache.put(
            &key,
            CachedValue::Page(page.clone()),
            self.options.ttls.for_operation(key.operation),
        );
        Ok(page)
    }
}

/// Insert a row, reporting a UNIQUE (key, locale) violation as `Duplicate`
fn insert_translation(
    conn: &Connection,
    key: &str,
    value: String,
    locale: &str,
) -> ServiceResult<TranslationRecord> {
    TranslationStore::create(conn, &NewTranslation::new(key, value, locale)).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::Duplicate {
                key: key.to_string(),
                locale: locale.to_string(),
            }
        } else {
            ServiceError::from(e)
        }
    })
}

fn load_one(conn: &Connection, id: i64) -> ServiceResult<TranslationWithTags> {
    TranslationStore::find_with_tags(conn, id)?.ok_or_else(|| {
        StoreError::NotFound {
            entity: "Translation",
            id,
        }
        .into()
    })
}

fn log_failure(operation: &str, e: &ServiceError) {
    match e {
        ServiceError::Storage(_) => error!("Failed to {}: {}", operation, e),
        _ => warn!("Failed to {}: {}", operation, e),
    }
}

fn missing_tags() -> ServiceError {
    ServiceError::Validation("At least one tag is required for each translation.".to_string())
}

fn validate_key(key: &str) -> ServiceResult<()> {
    if key.is_empty() {
        return Err(ServiceError::Validation("The translation key is required.".to_string()));
    }
    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(ServiceError::Validation(format!(
            "The translation key may not be greater than {} characters.",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

fn validate_value(value: &str) -> ServiceResult<()> {
    if value.is_empty() {
        return Err(ServiceError::Validation("The translation value is required.".to_string()));
    }
    Ok(())
}

fn validate_locale_code(locale: &str) -> ServiceResult<()> {
    if locale.is_empty() {
        return Err(ServiceError::Validation("The locale is required.".to_string()));
    }
    if locale.chars().count() > MAX_LOCALE_LENGTH {
        return Err(ServiceError::Validation(format!(
            "The locale may not be greater than {} characters.",
            MAX_LOCALE_LENGTH
        )));
    }
    Ok(())
}

// Emptiness of the list is checked later, after the duplicate check
fn validate_tag_names(tags: &[String]) -> ServiceResult<()> {
    for tag in tags {
        if tag.is_empty() {
            return Err(ServiceError::Validation("Each tag must be a non-empty string.".to_string()));
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(ServiceError::Validation(format!(
                "Each tag may not be greater than {} characters.",
                MAX_TAG_LENGTH
            )));
        }
    }
    Ok(())
}
