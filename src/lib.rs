/*!
 * # lingotag - tagged translation store
 *
 * A Rust library for storing localized key/value strings tagged with
 * categories, with CRUD, search and flat export over them.
 *
 * ## Features
 *
 * - SQLite persistence with one translation per key and locale
 * - Tags created lazily by name and attached many-to-many
 * - Paginated listing and substring search by tag, key or content
 * - Flat key -> value export per locale
 * - Read-through cache keyed by query shape, invalidated per locale on writes
 * - Bulk generation of synthetic datasets for load testing
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `database`: SQLite connection, schema and the stores:
 *   - `database::tag_store`: find-or-create of tags by name
 *   - `database::translation_store`: translation CRUD, search, export and tag links
 * - `translation`: the service layer:
 *   - `translation::service`: `TranslationService`, which enforces uniqueness and tag presence
 *   - `translation::cache`: the `CacheStore` port and the in-process `TranslationCache`
 * - `generator`: the bulk generator
 * - `app_config`: Configuration management
 * - `language_utils`: locale code utilities
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod errors;
pub mod generator;
pub mod language_utils;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{DatabaseConnection, Page, PageRequest, TranslationWithTags};
pub use errors::{ServiceError, ServiceResult, StoreError, StoreResult};
pub use generator::{BulkGenerator, GenerationReport, GeneratorOptions};
pub use language_utils::{get_language_name, validate_locale};
pub use translation::{
    CacheStore, CreateTranslation, ServiceOptions, TranslationCache, TranslationService,
    UpdateTranslation,
};
