/*!
 * Bulk generation of synthetic translations for load testing.
 *
 * The requested count is spread over the locales, `ceil(count / locales)`
 * each, filling locales in order until the global cap is reached. Keys
 * are `test.key.<index>` with the index restarting per locale, so a
 * re-run skips every pair that already exists.
 *
 * Rows are written through the stores in chunks, one transaction per
 * chunk. The service and its cache are bypassed.
 */

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::database::{DatabaseConnection, NewTranslation, TagStore, TranslationStore};
use crate::language_utils::validate_locale;
use crate::translation::service::MAX_LOCALE_LENGTH;

/// Most tags attached to one generated translation
const MAX_TAGS_PER_TRANSLATION: usize = 3;

/// Generator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Total number of translations to create
    pub count: usize,
    /// Locales to fill, in order
    pub locales: Vec<String>,
    /// Tag pool to draw from
    pub tags: Vec<String>,
    /// Candidates per transaction
    pub chunk_size: usize,
    /// Fixed seed for reproducible tag assignment
    pub seed: Option<u64>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            count: 100_000,
            locales: vec!["en".to_string(), "fr".to_string(), "es".to_string()],
            tags: vec!["web".to_string(), "mobile".to_string(), "desktop".to_string()],
            chunk_size: 1000,
            seed: None,
        }
    }
}

impl GeneratorOptions {
    pub fn validate(&self) -> Result<()> {
        if self.locales.is_empty() {
            return Err(anyhow!("At least one locale is required"));
        }
        if self.tags.is_empty() {
            return Err(anyhow!("At least one tag is required"));
        }
        if self.chunk_size == 0 {
            return Err(anyhow!("Chunk size must be greater than zero"));
        }
        for locale in &self.locales {
            if locale.chars().count() > MAX_LOCALE_LENGTH {
                return Err(anyhow!(
                    "Locale '{}' is longer than {} characters",
                    locale,
                    MAX_LOCALE_LENGTH
                ));
            }
            validate_locale(locale).with_context(|| format!("Invalid generator locale '{}'", locale))?;
        }
        Ok(())
    }

    /// Candidate keys per locale
    pub fn per_locale(&self) -> usize {
        if self.locales.is_empty() {
            0
        } else {
            self.count.div_ceil(self.locales.len())
        }
    }
}

/// Outcome of a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Requested count
    pub requested: usize,
    /// Rows inserted by this run
    pub created: usize,
    /// Candidates skipped because the pair already existed
    pub skipped: usize,
    /// Rows inserted per locale
    pub per_locale: BTreeMap<String, usize>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.created >= self.requested
    }
}

/// Synthetic dataset generator
#[derive(Debug, Clone)]
pub struct BulkGenerator {
    db: DatabaseConnection,
    options: GeneratorOptions,
}

impl BulkGenerator {
    pub fn new(db: DatabaseConnection, options: GeneratorOptions) -> Self {
        Self { db, options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Run without progress reporting
    pub fn run(&self) -> Result<GenerationReport> {
        self.run_with_progress(|_| {})
    }

    /// Run, calling `progress` after every created row
    pub fn run_with_progress<F>(&self, mut progress: F) -> Result<GenerationReport>
    where
        F: FnMut(&GenerationReport),
    {
        self.options.validate()?;

        let options = &self.options;
        let mut report = GenerationReport {
            requested: options.count,
            ..GenerationReport::default()
        };

        if options.count == 0 {
            return Ok(report);
        }

        info!(
            "Generating {} translations for locales: {}",
            options.count,
            options.locales.join(", ")
        );

        let tag_ids = self.prepare_tags()?;
        info!("Tags ready: {}", options.tags.join(", "));

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let per_locale = options.per_locale();

        'locales: for locale in &options.locales {
            info!("Generating translations for locale: {}", locale);
            report.per_locale.entry(locale.clone()).or_insert(0);

            let mut start = 0;
            while start < per_locale {
                if report.is_complete() {
                    break 'locales;
                }

                let end = (start + options.chunk_size).min(per_locale);
                self.generate_chunk(locale, start..end, &tag_ids, &mut rng, &mut report, &mut progress)
                    .inspect_err(|e| {
                        error!(
                            "Error generating translations for {} (keys {}..{}): {}",
                            locale, start, end, e
                        )
                    })?;

                debug!("Committed chunk {}..{} for locale {}", start, end, locale);
                start = end;
            }
        }

        info!(
            "Generated {} translations successfully ({} skipped)",
            report.created, report.skipped
        );
        Ok(report)
    }

    fn prepare_tags(&self) -> Result<Vec<i64>> {
        let mut names = self.options.tags.clone();
        names.sort();
        names.dedup();

        self.db
            .transaction(move |tx| -> Result<Vec<i64>> { Ok(TagStore::ids_from_names(tx, &names)?) })
            .context("Failed to create generator tags")
    }

    fn generate_chunk<F>(
        &self,
        locale: &str,
        indices: std::ops::Range<usize>,
        tag_ids: &[i64],
        rng: &mut StdRng,
        report: &mut GenerationReport,
        progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&GenerationReport),
    {
        // Counted locally so a rolled-back chunk leaves the report untouched
        let mut created = 0;
        let mut skipped = 0;
        let already_created = report.created;
        let requested = report.requested;

        self.db.transaction(|tx| -> Result<()> {
            for index in indices {
                if already_created + created >= requested {
                    break;
                }

                let key = format!("test.key.{}", index);
                if TranslationStore::exists_by_key_and_locale(tx, &key, locale)? {
                    skipped += 1;
                    continue;
                }

                let value = format!("This is a test value for {} in {}", key, locale);
                let record = TranslationStore::create(tx, &NewTranslation::new(key, value, locale))?;

                let max_tags = tag_ids.len().min(MAX_TAGS_PER_TRANSLATION);
                let amount = rng.random_range(1..=max_tags);
                let chosen: Vec<i64> = tag_ids.choose_multiple(&mut *rng, amount).copied().collect();
                TranslationStore::attach_tags(tx, record.id, &chosen)?;

                created += 1;
                let snapshot = GenerationReport {
                    created: already_created + created,
                    skipped: report.skipped + skipped,
                    ..report.clone()
                };
                progress(&snapshot);
            }
            Ok(())
        })?;

        report.created += created;
        report.skipped += skipped;
        *report.per_locale.entry(locale.to_string()).or_insert(0) += created;
        Ok(())
    }
}
