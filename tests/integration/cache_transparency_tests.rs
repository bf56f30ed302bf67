/*!
 * Integration tests comparing cached and uncached reads
 */

use anyhow::Result;
use lingotag::database::PageRequest;
use lingotag::translation::CacheStore;
use crate::common::{self, changes, new_translation};

#[tokio::test]
async fn test_reads_cachedAndUncached_shouldReturnIdenticalResults() -> Result<()> {
    let db = common::in_memory_db();
    let (cached, cache) = common::cached_service(db.clone());
    let uncached = common::uncached_service(db);

    common::seed_translations(&uncached, "same", "en", 20).await?;
    common::seed_translations(&uncached, "same", "fr", 5).await?;

    let page = PageRequest::new(Some(7), Some(7));
    for _ in 0..2 {
        assert_eq!(cached.list(Some("en"), page).await?, uncached.list(Some("en"), page).await?);
        assert_eq!(cached.list(None, page).await?, uncached.list(None, page).await?);
        assert_eq!(
            cached.search_by_tag("web", Some("en"), page).await?,
            uncached.search_by_tag("web", Some("en"), page).await?
        );
        assert_eq!(
            cached.search_by_key("same.1", None, page).await?,
            uncached.search_by_key("same.1", None, page).await?
        );
        assert_eq!(
            cached.search_by_content("for fr", None, page).await?,
            uncached.search_by_content("for fr", None, page).await?
        );
        assert_eq!(cached.export(Some("en")).await?, uncached.export(Some("en")).await?);
    }

    // Second pass was served from the cache
    let stats = cache.stats();
    assert_eq!(stats.misses, 6);
    assert_eq!(stats.hits, 6);
    Ok(())
}

#[tokio::test]
async fn test_write_shouldInvalidateExportAndDefaultListings() -> Result<()> {
    let (service, _cache) = common::cached_service(common::in_memory_db());
    let created = service
        .create(new_translation("greeting", "Hello", "en", &["web"]))
        .await?;

    // Warm the entries a write must forget
    service.export(Some("en")).await?;
    service.list(Some("en"), PageRequest::default()).await?;
    service.list(None, PageRequest::default()).await?;

    service
        .update(created.translation.id, changes("Hi", &["web"]))
        .await?;

    assert_eq!(service.export(Some("en")).await?["greeting"], "Hi");
    let listed = service.list(Some("en"), PageRequest::default()).await?;
    assert_eq!(listed.data[0].translation.value, "Hi");
    let all = service.list(None, PageRequest::default()).await?;
    assert_eq!(all.data[0].translation.value, "Hi");
    Ok(())
}

#[tokio::test]
async fn test_search_afterWrite_shouldStayStaleUntilCleared() -> Result<()> {
    let (service, _cache) = common::cached_service(common::in_memory_db());
    service
        .create(new_translation("a.key", "A", "en", &["web"]))
        .await?;

    let before = service.search_by_tag("web", None, PageRequest::default()).await?;
    assert_eq!(before.total, 1);

    service
        .create(new_translation("b.key", "B", "en", &["web"]))
        .await?;

    // Search entries expire by TTL only
    let stale = service.search_by_tag("web", None, PageRequest::default()).await?;
    assert_eq!(stale.total, 1);

    service.clear_cache();
    let fresh = service.search_by_tag("web", None, PageRequest::default()).await?;
    assert_eq!(fresh.total, 2);
    Ok(())
}

#[tokio::test]
async fn test_write_inOneLocale_shouldKeepOtherLocaleExportCached() -> Result<()> {
    let (service, cache) = common::cached_service(common::in_memory_db());
    service
        .create(new_translation("k", "Bonjour", "fr", &["web"]))
        .await?;
    service.export(Some("fr")).await?;
    let entries_before = cache.len();

    service
        .create(new_translation("k", "Hello", "en", &["web"]))
        .await?;

    assert_eq!(cache.len(), entries_before);
    assert_eq!(service.export(Some("fr")).await?["k"], "Bonjour");
    assert_eq!(cache.stats().hits, 1);
    Ok(())
}

#[tokio::test]
async fn test_list_withLocaleNamedAll_shouldNotShareAllLocalesEntry() -> Result<()> {
    let db = common::in_memory_db();
    let (cached, _cache) = common::cached_service(db.clone());
    let uncached = common::uncached_service(db);

    uncached.create(new_translation("a", "in en", "en", &["web"])).await?;
    uncached.create(new_translation("b", "in all", "all", &["web"])).await?;

    let page = PageRequest::default();
    let named_all = cached.list(Some("all"), page).await?;
    assert_eq!(named_all.total, 1);

    let every_locale = cached.list(None, page).await?;
    assert_eq!(every_locale, uncached.list(None, page).await?);
    assert_eq!(every_locale.total, 2);
    Ok(())
}
