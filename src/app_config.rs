use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::generator::GeneratorOptions;
use crate::translation::{CacheTtls, ServiceOptions};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// SQLite database file; the user data directory when unset
    #[serde(default)]
    pub database_path: Option<String>,

    /// Locale exported when none is requested
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Read cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Bulk generator defaults
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Cache configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    /// Whether reads are cached
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lifetime of cached listings
    #[serde(default = "default_list_ttl_secs")]
    pub list_ttl_secs: u64,

    /// Lifetime of cached searches
    #[serde(default = "default_search_ttl_secs")]
    pub search_ttl_secs: u64,

    /// Lifetime of cached exports
    #[serde(default = "default_export_ttl_secs")]
    pub export_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            list_ttl_secs: default_list_ttl_secs(),
            search_ttl_secs: default_search_ttl_secs(),
            export_ttl_secs: default_export_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            list: Duration::from_secs(self.list_ttl_secs),
            search: Duration::from_secs(self.search_ttl_secs),
            export: Duration::from_secs(self.export_ttl_secs),
        }
    }
}

/// Bulk generator configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Number of translations to generate
    #[serde(default = "default_generator_count")]
    pub count: usize,

    /// Locales to fill, in order
    #[serde(default = "default_generator_locales")]
    pub locales: Vec<String>,

    /// Tag pool
    #[serde(default = "default_generator_tags")]
    pub tags: Vec<String>,

    /// Candidates per transaction
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: default_generator_count(),
            locales: default_generator_locales(),
            tags: default_generator_tags(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

fn default_list_ttl_secs() -> u64 {
    30 * 60
}

fn default_search_ttl_secs() -> u64 {
    15 * 60
}

fn default_export_ttl_secs() -> u64 {
    60 * 60
}

fn default_generator_count() -> usize {
    100_000
}

fn default_generator_locales() -> Vec<String> {
    vec!["en".to_string(), "fr".to_string(), "es".to_string()]
}

fn default_generator_tags() -> Vec<String> {
    vec!["web".to_string(), "mobile".to_string(), "desktop".to_string()]
}

fn default_chunk_size() -> usize {
    1000
}

impl Config {
    /// Load the configuration file, writing the defaults first if it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;

            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_locale(&self.default_locale)
            .context("Invalid default_locale")?;

        if self.cache.list_ttl_secs == 0
            || self.cache.search_ttl_secs == 0
            || self.cache.export_ttl_secs == 0
        {
            return Err(anyhow!("Cache TTLs must be greater than zero"));
        }

        if self.generator.chunk_size == 0 {
            return Err(anyhow!("Generator chunk_size must be greater than zero"));
        }
        if self.generator.locales.is_empty() {
            return Err(anyhow!("Generator needs at least one locale"));
        }
        if self.generator.tags.is_empty() {
            return Err(anyhow!("Generator needs at least one tag"));
        }

        Ok(())
    }

    /// Database location, falling back to the user data directory
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => crate::database::DatabaseConnection::default_database_path(),
        }
    }

    /// Options for constructing the translation service
    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            default_locale: self.default_locale.clone(),
            ttls: self.cache.ttls(),
        }
    }

    /// Generator options from the configured defaults
    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            count: self.generator.count,
            locales: self.generator.locales.clone(),
            tags: self.generator.tags.clone(),
            chunk_size: self.generator.chunk_size,
            seed: None,
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: None,
            default_locale: default_locale(),
            cache: CacheConfig::default(),
            generator: GeneratorConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
