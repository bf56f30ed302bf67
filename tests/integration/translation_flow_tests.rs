/*!
 * Integration tests for translation write and read flows
 */

use std::collections::HashSet;

use anyhow::Result;
use futures::future::join_all;
use lingotag::database::{
    DatabaseConnection, NewTranslation, PageRequest, TagStore, TranslationStore,
};
use lingotag::errors::{ServiceError, StoreError};
use crate::common::{self, changes, new_translation};

#[tokio::test]
async fn test_welcomeMessage_fullLifecycle_shouldRoundTripThroughExport() -> Result<()> {
    let (service, _cache) = common::cached_service(common::in_memory_db());

    let created = service
        .create(new_translation(
            "welcome.message",
            "Welcome to our application",
            "en",
            &["web", "mobile"],
        ))
        .await?;
    assert_eq!(created.tag_names(), vec!["mobile", "web"]);

    let export = service.export(Some("en")).await?;
    assert_eq!(export["welcome.message"], "Welcome to our application");

    let id = created.translation.id;
    let updated = service
        .update(id, changes("Updated welcome message", &["web", "desktop"]))
        .await?;
    assert_eq!(updated.translation.value, "Updated welcome message");
    assert_eq!(updated.tag_names(), vec!["desktop", "web"]);

    let export = service.export(Some("en")).await?;
    assert_eq!(export["welcome.message"], "Updated welcome message");

    assert!(service.delete(id).await?);

    let export = service.export(Some("en")).await?;
    assert!(!export.contains_key("welcome.message"));
    assert!(matches!(service.get(id).await, Err(ServiceError::NotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn test_create_concurrentDuplicates_shouldLetExactlyOneSucceed() -> Result<()> {
    let service = common::uncached_service(common::in_memory_db());

    let attempts = (0..4).map(|i| {
        let service = service.clone();
        let value = format!("Attempt {}", i);
        async move {
            service
                .create(new_translation("race.key", &value, "en", &["web"]))
                .await
        }
    });
    let results = join_all(attempts).await;

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::Duplicate { .. })))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(duplicates, 3);

    let stats = service.database().stats()?;
    assert_eq!(stats.translation_count, 1);
    assert_eq!(stats.link_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_update_shouldSyncRatherThanMergeTags() -> Result<()> {
    let service = common::uncached_service(common::in_memory_db());
    let created = service
        .create(new_translation("k", "v", "en", &["A", "B"]))
        .await?;

    let updated = service
        .update(created.translation.id, changes("v2", &["B", "C"]))
        .await?;

    assert_eq!(updated.tag_names(), vec!["B", "C"]);
    // Detached tag rows survive; only the link is removed
    let stats = service.database().stats()?;
    assert_eq!(stats.tag_count, 3);
    assert_eq!(stats.link_count, 2);
    Ok(())
}

#[tokio::test]
async fn test_delete_shouldCascadeTagLinks() -> Result<()> {
    let service = common::uncached_service(common::in_memory_db());
    let created = service
        .create(new_translation("k", "v", "en", &["web", "mobile", "desktop"]))
        .await?;

    assert!(service.delete(created.translation.id).await?);

    let stats = service.database().stats()?;
    assert_eq!(stats.translation_count, 0);
    assert_eq!(stats.link_count, 0);
    assert!(matches!(
        service.delete(created.translation.id).await,
        Err(ServiceError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_list_offsetSlices_shouldBeDisjointExhaustiveAndOrdered() -> Result<()> {
    let service = common::uncached_service(common::in_memory_db());
    common::seed_translations(&service, "page", "en", 37).await?;

    let mut seen = Vec::new();
    for k in 0..4 {
        let page = service
            .list(Some("en"), PageRequest::new(Some(10), Some(k * 10)))
            .await?;
        assert_eq!(page.total, 37);
        assert_eq!(page.last_page, 4);
        assert_eq!(page.current_page, k + 1);
        seen.extend(page.data.iter().map(|t| t.translation.id));
    }

    let unique: HashSet<i64> = seen.iter().copied().collect();
    assert_eq!(seen.len(), 37);
    assert_eq!(unique.len(), 37);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));

    let beyond = service
        .list(Some("en"), PageRequest::new(Some(10), Some(40)))
        .await?;
    assert!(beyond.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_list_withoutLocale_shouldSpanAllLocales() -> Result<()> {
    let service = common::uncached_service(common::in_memory_db());
    common::seed_translations(&service, "multi", "en", 3).await?;
    common::seed_translations(&service, "multi", "fr", 2).await?;

    let all = service.list(None, PageRequest::default()).await?;
    let fr = service.list(Some("fr"), PageRequest::default()).await?;

    assert_eq!(all.total, 5);
    assert_eq!(fr.total, 2);
    assert!(fr.data.iter().all(|t| t.translation.locale == "fr"));
    Ok(())
}

#[tokio::test]
async fn test_searches_shouldFilterByLocaleAndField() -> Result<()> {
    let service = common::uncached_service(common::in_memory_db());
    service
        .create(new_translation("checkout.button", "Pay now", "en", &["mobile"]))
        .await?;
    service
        .create(new_translation("checkout.button", "Payer", "fr", &["mobile"]))
        .await?;
    service
        .create(new_translation("home.title", "Welcome home", "en", &["web"]))
        .await?;

    let by_tag = service.search_by_tag("mob", Some("en"), PageRequest::default()).await?;
    assert_eq!(by_tag.total, 1);
    assert_eq!(by_tag.data[0].translation.value, "Pay now");

    let by_key = service.search_by_key("checkout", None, PageRequest::default()).await?;
    assert_eq!(by_key.total, 2);

    let by_content = service.search_by_content("home", None, PageRequest::default()).await?;
    assert_eq!(by_content.total, 1);
    assert_eq!(by_content.data[0].translation.key, "home.title");
    Ok(())
}

#[tokio::test]
async fn test_fileDatabase_shouldPersistAcrossReopen() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::database_path(dir.path());

    {
        let service = common::uncached_service(DatabaseConnection::new(&path)?);
        service
            .create(new_translation("persisted", "Still here", "en", &["web"]))
            .await?;
    }

    let service = common::uncached_service(DatabaseConnection::new(&path)?);
    let export = service.export(Some("en")).await?;
    assert_eq!(export["persisted"], "Still here");
    Ok(())
}

#[tokio::test]
async fn test_transaction_failingAfterInsert_shouldLeaveNoRow() -> Result<()> {
    let db = common::in_memory_db();

    let result = db.transaction(|tx| -> Result<(), StoreError> {
        let record = TranslationStore::create(tx, &NewTranslation::new("half.done", "v", "en"))?;
        let tag_ids = TagStore::ids_from_names(tx, &["web"])?;
        TranslationStore::attach_tags(tx, record.id, &tag_ids)?;
        Err(StoreError::NotFound {
            entity: "tags",
            id: record.id,
        })
    });
    assert!(result.is_err());

    let stats = db.stats()?;
    assert_eq!(stats.translation_count, 0);
    assert_eq!(stats.tag_count, 0);
    assert_eq!(stats.link_count, 0);

    let service = common::uncached_service(db);
    assert!(service.export(Some("en")).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_list_withMaximumOffset_shouldReturnEmptyPage() -> Result<()> {
    let service = common::uncached_service(common::in_memory_db());
    common::seed_translations(&service, "edge", "en", 3).await?;

    let page = service
        .list(Some("en"), PageRequest::new(Some(1), Some(u32::MAX)))
        .await?;

    assert!(page.is_empty());
    assert_eq!(page.total, 3);
    assert_eq!(page.current_page, u32::MAX);
    Ok(())
}
