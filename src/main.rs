// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use lingotag::app_config::{self, Config};
use lingotag::database::{DatabaseConnection, PageRequest};
use lingotag::generator::{BulkGenerator, GenerationReport};
use lingotag::language_utils::get_language_name;
use lingotag::translation::{
    CreateTranslation, TranslationCache, TranslationService, UpdateTranslation,
};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Field matched by `search`
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SearchField {
    Tag,
    Key,
    Content,
}

#[derive(Args, Debug, Clone, Copy)]
struct PaginationArgs {
    /// Page size (default 15)
    #[arg(long)]
    limit: Option<u32>,

    /// Row offset; snapped to the start of its page
    #[arg(long)]
    offset: Option<u32>,
}

impl From<PaginationArgs> for PageRequest {
    fn from(args: PaginationArgs) -> Self {
        PageRequest::new(args.limit, args.offset)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a translation
    Create {
        /// Translation key (e.g. 'welcome.message')
        key: String,

        /// Localized text
        value: String,

        /// Locale code (e.g. 'en', 'pt-BR')
        #[arg(long)]
        locale: String,

        /// Tag name; repeat for several tags
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Show one translation with its tags
    Get {
        id: i64,
    },

    /// Replace the value and the tag set of a translation
    Update {
        id: i64,

        /// New localized text
        value: String,

        /// Tag name; repeat for several tags. Replaces the existing set
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Delete a translation
    Delete {
        id: i64,
    },

    /// List translations, optionally for one locale
    List {
        #[arg(long)]
        locale: Option<String>,

        #[command(flatten)]
        pagination: PaginationArgs,
    },

    /// Substring search by tag name, key or value
    Search {
        #[arg(value_enum)]
        field: SearchField,

        term: String,

        #[arg(long)]
        locale: Option<String>,

        #[command(flatten)]
        pagination: PaginationArgs,
    },

    /// Export a locale as a flat key/value JSON object
    Export {
        /// Locale to export; the configured default locale when omitted
        locale: Option<String>,
    },

    /// Fill the database with synthetic translations for load testing
    Generate {
        /// Number of translations to generate
        count: Option<usize>,

        /// Comma-separated list of locales
        #[arg(long, value_delimiter = ',')]
        locales: Option<Vec<String>>,

        /// Comma-separated list of tags
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// Candidates per transaction
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Seed for reproducible tag assignment
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show database and cache statistics
    Stats,

    /// Generate shell completions for lingotag
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// lingotag - tagged translation store
///
/// Stores localized key/value strings with tags, and offers search,
/// export and bulk generation over them.
#[derive(Parser, Debug)]
#[command(name = "lingotag")]
#[command(version)]
#[command(about = "Tagged translation store")]
#[command(long_about = "lingotag stores localized key/value strings tagged with categories.

EXAMPLES:
    lingotag create welcome.message 'Welcome' --locale en -t web -t mobile
    lingotag update 1 'Welcome back' -t web -t desktop
    lingotag list --locale en --limit 20 --offset 40
    lingotag search tag mob --locale en
    lingotag export fr > fr.json
    lingotag generate 50000 --locales en,fr --tags web,mobile
    lingotag completions bash > lingotag.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Database file path, overriding the configuration
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Bypass the read cache
    #[arg(long, global = true)]
    no_cache: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and emoji for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, emoji) = Self::style_for_level(record.level());

            // stdout carries command output; logs go to stderr
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "lingotag", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    let db_path = config.database_path()?;
    let db = DatabaseConnection::new(&db_path)?;

    let cache = Arc::new(TranslationCache::new(config.cache.enabled));
    let service = TranslationService::new(db.clone(), cache, config.service_options());

    match cli.command {
        Commands::Create {
            key,
            value,
            locale,
            tags,
        } => {
            let created = service
                .create(CreateTranslation {
                    key,
                    value,
                    locale,
                    tags,
                })
                .await?;
            print_json(&created)
        }
        Commands::Get { id } => print_json(&service.get(id).await?),
        Commands::Update { id, value, tags } => {
            let updated = service.update(id, UpdateTranslation { value, tags }).await?;
            print_json(&updated)
        }
        Commands::Delete { id } => {
            let deleted = service.delete(id).await?;
            print_json(&serde_json::json!({ "id": id, "deleted": deleted }))
        }
        Commands::List { locale, pagination } => {
            let page = service.list(locale.as_deref(), pagination.into()).await?;
            print_json(&page)
        }
        Commands::Search {
            field,
            term,
            locale,
            pagination,
        } => {
            let locale = locale.as_deref();
            let page = pagination.into();
            let results = match field {
                SearchField::Tag => service.search_by_tag(&term, locale, page).await?,
                SearchField::Key => service.search_by_key(&term, locale, page).await?,
                SearchField::Content => service.search_by_content(&term, locale, page).await?,
            };
            print_json(&results)
        }
        Commands::Export { locale } => print_json(&service.export(locale.as_deref()).await?),
        Commands::Generate {
            count,
            locales,
            tags,
            chunk_size,
            seed,
        } => {
            let mut options = config.generator_options();
            if let Some(count) = count {
                options.count = count;
            }
            if let Some(locales) = locales {
                options.locales = locales;
            }
            if let Some(tags) = tags {
                options.tags = tags;
            }
            if let Some(chunk_size) = chunk_size {
                options.chunk_size = chunk_size;
            }
            options.seed = seed;

            let report = run_generator(BulkGenerator::new(db, options)).await?;
            print_json(&report)
        }
        Commands::Stats => {
            let stats = db.stats()?;
            info!("{}", stats);
            let languages: BTreeMap<&str, String> = stats
                .locales
                .iter()
                .filter_map(|locale| get_language_name(locale).ok().map(|name| (locale.as_str(), name)))
                .collect();
            print_json(&serde_json::json!({
                "database": db_path,
                "default_locale": service.default_locale(),
                "stats": stats,
                "languages": languages,
                "cache": {
                    "enabled": config.cache.enabled,
                    "list_ttl_secs": config.cache.list_ttl_secs,
                    "search_ttl_secs": config.cache.search_ttl_secs,
                    "export_ttl_secs": config.cache.export_ttl_secs,
                },
            }))
        }
        Commands::Completions { .. } => Ok(()),
    }
}

/// Load or create the configuration and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(database) = &cli.database {
        config.database_path = Some(database.to_string_lossy().into_owned());
    }

    if cli.no_cache {
        config.cache.enabled = false;
    }

    // Update log level in config if specified via command line
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

/// Run the generator on the blocking pool behind a progress bar
async fn run_generator(generator: BulkGenerator) -> Result<GenerationReport> {
    let progress_bar = ProgressBar::new(generator.options().count as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} translations ({percent}%) {msg} {eta}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));
    progress_bar.set_message("Generating");

    let bar = progress_bar.clone();
    let report = tokio::task::spawn_blocking(move || {
        generator.run_with_progress(|snapshot| bar.set_position(snapshot.created as u64))
    })
    .await
    .context("Generator task failed")??;

    progress_bar.finish_with_message(format!("{} created, {} skipped", report.created, report.skipped));
    Ok(report)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
