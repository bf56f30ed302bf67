/*!
 * Tests for error types and conversions
 */

use lingotag::errors::{ServiceError, StoreError};

#[test]
fn test_serviceError_duplicate_shouldDisplayKeyAndLocale() {
    let error = ServiceError::Duplicate {
        key: "welcome.message".to_string(),
        locale: "en".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("welcome.message"));
    assert!(display.contains("'en'"));
}

#[test]
fn test_serviceError_statusCode_shouldFollowHttpConventions() {
    assert_eq!(ServiceError::NotFound { id: 1 }.status_code(), 404);
    assert_eq!(
        ServiceError::Duplicate {
            key: "k".to_string(),
            locale: "en".to_string()
        }
        .status_code(),
        409
    );
    assert_eq!(ServiceError::Validation("no tags".to_string()).status_code(), 422);
    assert_eq!(
        ServiceError::Storage(StoreError::Lock("poisoned".to_string())).status_code(),
        500
    );
}

#[test]
fn test_fromStoreError_notFound_shouldKeepId() {
    let error: ServiceError = StoreError::NotFound {
        entity: "Translation",
        id: 42,
    }
    .into();
    assert!(matches!(error, ServiceError::NotFound { id: 42 }));
}

#[test]
fn test_fromStoreError_other_shouldBecomeStorage() {
    let error: ServiceError = StoreError::TaskJoin("cancelled".to_string()).into();
    assert!(matches!(error, ServiceError::Storage(StoreError::TaskJoin(_))));
    assert!(format!("{}", error).contains("cancelled"));
}

#[test]
fn test_fromRusqliteError_uniqueConstraint_shouldClassifyAsUniqueViolation() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
        .unwrap();

    let raw = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err();
    let error = StoreError::from(raw);

    assert!(error.is_unique_violation());
}

#[test]
fn test_fromRusqliteError_otherFailure_shouldStaySqlite() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();

    let raw = conn.execute("INSERT INTO missing VALUES (1)", []).unwrap_err();
    let error = StoreError::from(raw);

    assert!(!error.is_unique_violation());
    assert!(matches!(error, StoreError::Sqlite(_)));
}
