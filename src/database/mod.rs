/*!
 * Database module for persistent storage of translations and tags.
 *
 * This module provides SQLite-based persistence for:
 * - Translations, unique per key and locale
 * - Tags, created lazily by name
 * - The translation/tag association with cascading deletes
 */

pub mod connection;
pub mod models;
pub mod schema;
pub mod tag_store;
pub mod translation_store;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use models::{
    NewTranslation, Page, PageRequest, TagRecord, TranslationChanges, TranslationRecord,
    TranslationWithTags, DEFAULT_PAGE_SIZE,
};
pub use tag_store::TagStore;
pub use translation_store::{SyncChanges, TranslationStore};
