/*!
 * Translation read caching.
 *
 * Reads are cached by query shape. A `CacheKey` names the operation, the
 * locale (or "all"), the search term if any and the effective pagination,
 * and renders to a namespaced string such as
 * `translations.search.tag.<sha256>.en.15.0` for logging. Entries are
 * stored under the typed key itself, so a locale literally named "all"
 * never shares an entry with an all-locales query.
 *
 * The service talks to the `CacheStore` trait; `TranslationCache` is the
 * in-process implementation with per-entry expiry.
 */

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::database::{Page, PageRequest, TranslationWithTags};

/// Locale segment used when a query spans all locales
const ALL_LOCALES: &str = "all";

/// Cached query kinds, one key namespace each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOperation {
    List,
    SearchByTag,
    SearchByKey,
    SearchByContent,
    Export,
}

impl CacheOperation {
    /// Key prefix for this operation
    pub fn namespace(&self) -> &'static str {
        match self {
            CacheOperation::List => "translations.list",
            CacheOperation::SearchByTag => "translations.search.tag",
            CacheOperation::SearchByKey => "translations.search.key",
            CacheOperation::SearchByContent => "translations.search.content",
            CacheOperation::Export => "translations.export",
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(
            self,
            CacheOperation::SearchByTag | CacheOperation::SearchByKey | CacheOperation::SearchByContent
        )
    }
}

/// Typed cache key derived from a query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub operation: CacheOperation,
    /// `None` means all locales
    pub locale: Option<String>,
    pub term: Option<String>,
    /// Effective page size, `None` for unpaginated queries
    pub limit: Option<u32>,
    /// Effective row offset, `None` for unpaginated queries
    pub offset: Option<i64>,
}

impl CacheKey {
    /// Key for a paginated listing
    pub fn list(locale: Option<&str>, page: PageRequest) -> Self {
        Self::paginated(CacheOperation::List, locale, None, page)
    }

    /// Key for a paginated search
    pub fn search(operation: CacheOperation, term: &str, locale: Option<&str>, page: PageRequest) -> Self {
        Self::paginated(operation, locale, Some(term), page)
    }

    /// Key for a locale export
    pub fn export(locale: &str) -> Self {
        Self {
            operation: CacheOperation::Export,
            locale: Some(locale.to_string()),
            term: None,
            limit: None,
            offset: None,
        }
    }

    fn paginated(
        operation: CacheOperation,
        locale: Option<&str>,
        term: Option<&str>,
        page: PageRequest,
    ) -> Self {
        // Normalized so equivalent requests share one entry
        Self {
            operation,
            locale: locale.map(str::to_string),
            term: term.map(str::to_string),
            limit: Some(page.per_page()),
            offset: Some(page.sql_offset()),
        }
    }

    /// Deterministic string form of the key
    pub fn render(&self) -> String {
        let mut parts = vec![self.operation.namespace().to_string()];

        if let Some(term) = &self.term {
            parts.push(hash_term(term));
        }
        parts.push(self.locale.as_deref().unwrap_or(ALL_LOCALES).to_string());
        if let Some(limit) = self.limit {
            parts.push(limit.to_string());
        }
        if let Some(offset) = self.offset {
            parts.push(offset.to_string());
        }

        parts.join(".")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn hash_term(term: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(term.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Value stored in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    Page(Page<TranslationWithTags>),
    Export(BTreeMap<String, String>),
}

impl CachedValue {
    pub fn into_page(self) -> Option<Page<TranslationWithTags>> {
        match self {
            CachedValue::Page(page) => Some(page),
            CachedValue::Export(_) => None,
        }
    }

    pub fn into_export(self) -> Option<BTreeMap<String, String>> {
        match self {
            CachedValue::Export(export) => Some(export),
            CachedValue::Page(_) => None,
        }
    }
}

/// Time-to-live per cached operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub list: Duration,
    pub search: Duration,
    pub export: Duration,
}

impl CacheTtls {
    pub fn for_operation(&self, operation: CacheOperation) -> Duration {
        match operation {
            CacheOperation::List => self.list,
            CacheOperation::Export => self.export,
            _ => self.search,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            list: Duration::from_secs(30 * 60),
            search: Duration::from_secs(15 * 60),
            export: Duration::from_secs(60 * 60),
        }
    }
}

/// Cache port used by the translation service
pub trait CacheStore: Send + Sync {
    /// Unexpired value for the key, if any
    fn get(&self, key: &CacheKey) -> Option<CachedValue>;

    /// Store a value that expires after `ttl`
    fn put(&self, key: &CacheKey, value: CachedValue, ttl: Duration);

    /// Remove one entry; returns whether it was present
    fn forget(&self, key: &CacheKey) -> bool;

    /// Remove every entry
    fn clear(&self);
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedValue,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process translation cache
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationCache {
    /// Create a new translation cache
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            enabled,
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            enabled: self.enabled,
            entries: self.len(),
            hits,
            misses,
            hit_rate,
        }
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut cache = self.cache.write();
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_expired(now));
        let removed = before - cache.len();

        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Get the number of entries in the cache, expired ones included
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Enable or disable the cache
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn record_hit(&self) {
        *self.hits.write() += 1;
    }

    fn record_miss(&self) {
        *self.misses.write() += 1;
    }
}

impl CacheStore for TranslationCache {
    fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();

        let expired = {
            let cache = self.cache.read();
            match cache.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    self.record_hit();
                    debug!("Cache hit for {}", key);
                    return Some(entry.value.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            let mut cache = self.cache.write();
            // Re-check: another writer may have refreshed it
            if cache.get(key).is_some_and(|entry| entry.is_expired(now)) {
                cache.remove(key);
            }
        }

        self.record_miss();
        debug!("Cache miss for {}", key);
        None
    }

    fn put(&self, key: &CacheKey, value: CachedValue, ttl: Duration) {
        if !self.enabled {
            return;
        }

        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.cache.write().insert(key.clone(), entry);

        debug!("Cached {} for {}s", key, ttl.as_secs());
    }

    fn forget(&self, key: &CacheKey) -> bool {
        let removed = self.cache.write().remove(key).is_some();
        if removed {
            debug!("Forgot cache entry {}", key);
        }
        removed
    }

    fn clear(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;

        debug!("Translation cache cleared");
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
            enabled: self.enabled,
        }
    }
}

impl fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationCache")
            .field("entries", &self.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}
