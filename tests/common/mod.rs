/*!
 * Common test utilities for the lingotag test suite
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use lingotag::database::DatabaseConnection;
use lingotag::translation::{
    CreateTranslation, ServiceOptions, TranslationCache, TranslationService, UpdateTranslation,
};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Path of a database file inside the given directory
pub fn database_path(dir: &Path) -> PathBuf {
    dir.join("lingotag-test.db")
}

/// Fresh in-memory database
pub fn in_memory_db() -> DatabaseConnection {
    DatabaseConnection::new_in_memory().expect("Failed to create in-memory database")
}

/// Service with an enabled in-process cache, plus a handle on that cache
pub fn cached_service(db: DatabaseConnection) -> (TranslationService, Arc<TranslationCache>) {
    let cache = Arc::new(TranslationCache::new(true));
    let service = TranslationService::new(db, cache.clone(), ServiceOptions::default());
    (service, cache)
}

/// Service that always reads from the database
pub fn uncached_service(db: DatabaseConnection) -> TranslationService {
    TranslationService::uncached(db, ServiceOptions::default())
}

/// Create input with owned fields
pub fn new_translation(key: &str, value: &str, locale: &str, tags: &[&str]) -> CreateTranslation {
    CreateTranslation {
        key: key.to_string(),
        value: value.to_string(),
        locale: locale.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// Update input with owned fields
pub fn changes(value: &str, tags: &[&str]) -> UpdateTranslation {
    UpdateTranslation {
        value: value.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// Insert `count` translations `<prefix>.<i>` in one locale, tagged alternately
pub async fn seed_translations(
    service: &TranslationService,
    prefix: &str,
    locale: &str,
    count: usize,
) -> Result<()> {
    for i in 0..count {
        let tag = if i % 2 == 0 { "web" } else { "mobile" };
        let key = format!("{}.{}", prefix, i);
        let value = format!("Value {} for {}", i, locale);
        service
            .create(new_translation(&key, &value, locale, &[tag]))
            .await?;
    }
    Ok(())
}
