//! Category-to-FAQ relation models.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use validator::Validate;

use shared::validation::validate_language_code;

/// Category id -> record ids, ordered by category then record.
pub type CategoryFaqMatrix = BTreeMap<i64, BTreeSet<i64>>;

/// Category id -> number of language-consistent records.
pub type CategoryCounts = BTreeMap<i64, i64>;

/// Category membership of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub category_id: i64,
    pub category_lang: String,
}

/// A row of the category relation join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRelation {
    pub category_id: i64,
    #[validate(custom(function = "validate_language_code"))]
    pub category_lang: String,
    pub record_id: i64,
    #[validate(custom(function = "validate_language_code"))]
    pub record_lang: String,
}

/// Fields of a FAQ record used when composing mails about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMailInfo {
    pub subject: String,
    pub content: String,
    pub author: String,
    pub email: String,
    pub notes: Option<String>,
}

/// Builds the matrix from `(category_id, record_id)` pairs.
pub fn build_matrix(pairs: impl IntoIterator<Item = (i64, i64)>) -> CategoryFaqMatrix {
    let mut matrix = CategoryFaqMatrix::new();
    for (category_id, record_id) in pairs {
        matrix.entry(category_id).or_default().insert(record_id);
    }
    matrix
}
