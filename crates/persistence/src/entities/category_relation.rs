//! Category relation entities.

use domain::models::{CategoryRef, RecordMailInfo};
use sqlx::FromRow;

/// A `(category_id, record_id)` pair of the category matrix.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRecordPairEntity {
    pub category_id: i64,
    pub record_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryCountEntity {
    pub category_id: i64,
    pub record_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryRefEntity {
    pub category_id: i64,
    pub category_lang: String,
}

impl From<CategoryRefEntity> for CategoryRef {
    fn from(entity: CategoryRefEntity) -> Self {
        Self {
            category_id: entity.category_id,
            category_lang: entity.category_lang,
        }
    }
}

/// FAQ record fields used in notification mails.
#[derive(Debug, Clone, FromRow)]
pub struct RecordMailInfoEntity {
    pub subject: String,
    pub content: Option<String>,
    pub author: String,
    pub email: String,
    pub notes: Option<String>,
}

impl From<RecordMailInfoEntity> for RecordMailInfo {
    fn from(entity: RecordMailInfoEntity) -> Self {
        Self {
            subject: entity.subject,
            content: entity.content.unwrap_or_default(),
            author: entity.author,
            email: entity.email,
            notes: entity.notes,
        }
    }
}
