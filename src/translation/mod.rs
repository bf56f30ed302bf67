/*!
 * Translation service layer.
 *
 * - `service`: the `TranslationService` that enforces uniqueness and tag
 *   presence on top of the stores
 * - `cache`: the read-through cache port and its in-process implementation
 */

// Re-export main types for easier usage
pub use self::cache::{
    CacheKey, CacheOperation, CacheStats, CacheStore, CacheTtls, CachedValue, TranslationCache,
};
pub use self::service::{CreateTranslation, ServiceOptions, TranslationService, UpdateTranslation};

// Submodules
pub mod cache;
pub mod service;
