/*!
 * Integration tests for the bulk generator
 */

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use lingotag::database::{DatabaseConnection, PageRequest, TranslationStore};
use lingotag::errors::StoreError;
use lingotag::generator::{BulkGenerator, GeneratorOptions};
use crate::common;

fn options(count: usize, locales: &[&str], seed: u64) -> GeneratorOptions {
    GeneratorOptions {
        count,
        locales: locales.iter().map(|l| l.to_string()).collect(),
        chunk_size: 10,
        seed: Some(seed),
        ..GeneratorOptions::default()
    }
}

/// key/locale -> tag names for every row in the database
fn snapshot(db: &DatabaseConnection) -> HashMap<(String, String), Vec<String>> {
    db.execute::<_, _, StoreError>(|conn| {
        let page = TranslationStore::paginate(conn, PageRequest::new(Some(10_000), None))?;
        Ok(page
            .data
            .into_iter()
            .map(|t| {
                let tags = t.tag_names().iter().map(|n| n.to_string()).collect();
                ((t.translation.key, t.translation.locale), tags)
            })
            .collect())
    })
    .expect("Failed to read snapshot")
}

#[test]
fn test_generate_fiftyOverTwoLocales_shouldSplitEvenly() -> Result<()> {
    let db = common::in_memory_db();
    let generator = BulkGenerator::new(db.clone(), options(50, &["en", "fr"], 7));

    let report = generator.run()?;

    assert_eq!(report.created, 50);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.per_locale["en"], 25);
    assert_eq!(report.per_locale["fr"], 25);

    let rows = snapshot(&db);
    assert_eq!(rows.len(), 50);

    let pool: HashSet<&str> = ["web", "mobile", "desktop"].into_iter().collect();
    for ((key, locale), tags) in &rows {
        assert!(key.starts_with("test.key."));
        assert!((1..=3).contains(&tags.len()), "{} / {} has {} tags", key, locale, tags.len());
        let unique: HashSet<&String> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
        assert!(tags.iter().all(|t| pool.contains(t.as_str())));
    }

    let export = db.execute::<_, _, StoreError>(|conn| TranslationStore::export_by_locale(conn, "fr"))?;
    assert_eq!(export["test.key.0"], "This is a test value for test.key.0 in fr");
    assert!(export.contains_key("test.key.24"));
    assert!(!export.contains_key("test.key.25"));
    Ok(())
}

#[test]
fn test_generate_rerun_shouldCreateNothing() -> Result<()> {
    let db = common::in_memory_db();
    BulkGenerator::new(db.clone(), options(50, &["en", "fr"], 1)).run()?;

    let report = BulkGenerator::new(db.clone(), options(50, &["en", "fr"], 2)).run()?;

    assert_eq!(report.created, 0);
    assert_eq!(report.skipped, 50);
    assert_eq!(db.stats()?.translation_count, 50);
    Ok(())
}

#[test]
fn test_generate_sameSeed_shouldAssignSameTags() -> Result<()> {
    let first = common::in_memory_db();
    let second = common::in_memory_db();

    BulkGenerator::new(first.clone(), options(30, &["en"], 99)).run()?;
    BulkGenerator::new(second.clone(), options(30, &["en"], 99)).run()?;

    assert_eq!(snapshot(&first), snapshot(&second));
    Ok(())
}

#[test]
fn test_generate_withFailingLocale_shouldRollBackChunkAndAbort() -> Result<()> {
    let db = common::in_memory_db();
    db.execute::<_, _, StoreError>(|conn| {
        conn.execute_batch(
            "CREATE TRIGGER reject_fr BEFORE INSERT ON translations
             WHEN NEW.locale = 'fr'
             BEGIN SELECT RAISE(ABORT, 'fr rejected'); END;",
        )?;
        Ok(())
    })?;
    let generator = BulkGenerator::new(db.clone(), options(8, &["en", "fr"], 3));

    let result = generator.run();

    assert!(result.is_err());
    let stats = db.stats()?;
    assert_eq!(stats.translation_count, 4);
    assert_eq!(stats.locales, vec!["en"]);
    Ok(())
}

#[test]
fn test_generate_withFileDatabase_shouldPersist() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::database_path(dir.path());

    BulkGenerator::new(DatabaseConnection::new(&path)?, options(12, &["en", "fr", "es"], 5)).run()?;

    let reopened = DatabaseConnection::new(&path)?;
    let stats = reopened.stats()?;
    assert_eq!(stats.translation_count, 12);
    assert_eq!(stats.locales, vec!["en", "es", "fr"]);
    assert_eq!(stats.tag_count, 3);
    Ok(())
}

#[test]
fn test_generate_withUnknownLocale_shouldFailBeforeWriting() -> Result<()> {
    let db = common::in_memory_db();

    let result = BulkGenerator::new(db.clone(), options(6, &["en", "qqq-not-a-language"], 1)).run();
    assert!(result.is_err());

    let result = BulkGenerator::new(db.clone(), options(6, &["en", "zz"], 1)).run();
    assert!(result.is_err());

    assert_eq!(db.stats()?.translation_count, 0);
    Ok(())
}
