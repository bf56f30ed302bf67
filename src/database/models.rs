/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data, plus the composed read models
 * (translation with eagerly loaded tags, paginated results).
 */

use serde::{Deserialize, Serialize};

/// Page size used when a caller does not provide a limit
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// Translation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Database ID
    pub id: i64,
    /// Translation key, unique per locale
    pub key: String,
    /// Localized text
    pub value: String,
    /// Locale code (e.g. "en", "pt-BR")
    pub locale: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl TranslationRecord {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            key: row.get(1)?,
            value: row.get(2)?,
            locale: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

/// Tag record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Database ID
    pub id: i64,
    /// Unique tag name
    pub name: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl TagRecord {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }
}

/// Translation with its tags loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationWithTags {
    #[serde(flatten)]
    pub translation: TranslationRecord,
    /// Attached tags, ordered by name
    pub tags: Vec<TagRecord>,
}

impl TranslationWithTags {
    /// Names of the attached tags
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Fields for inserting a translation
#[derive(Debug, Clone)]
pub struct NewTranslation {
    pub key: String,
    pub value: String,
    pub locale: String,
}

impl NewTranslation {
    pub fn new(key: impl Into<String>, value: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            locale: locale.into(),
        }
    }
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct TranslationChanges {
    pub key: Option<String>,
    pub value: Option<String>,
    pub locale: Option<String>,
}

impl TranslationChanges {
    /// Changes that only replace the value
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

/// Limit/offset pagination request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageRequest {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self { limit, offset }
    }

    /// Effective page size (limit 0 is treated as unset)
    pub fn per_page(&self) -> u32 {
        match self.limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// 1-based page number: floor(offset / limit) + 1, saturating at `u32::MAX`
    pub fn page(&self) -> u32 {
        (self.offset.unwrap_or(0) / self.per_page()).saturating_add(1)
    }

    /// Row offset of the first item on the resolved page
    pub fn sql_offset(&self) -> i64 {
        let per_page = i64::from(self.per_page());
        i64::from(self.offset.unwrap_or(0)) / per_page * per_page
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub current_page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total: i64, data: Vec<T>) -> Self {
        let per_page = request.per_page();
        let last_page = if total <= 0 {
            1
        } else {
            ((total + per_page as i64 - 1) / per_page as i64) as u32
        };

        Self {
            current_page: request.page(),
            per_page,
            total,
            last_page,
            data,
        }
    }

    /// Number of items on this page
    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Current UTC timestamp in the format stored in the database
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
