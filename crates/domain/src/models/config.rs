//! Tenant configuration entries and typed settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known configuration keys stored in each tenant's `config` table.
pub mod keys {
    pub const IS_MASTER: &str = "isMaster";
    pub const REFERENCE_URL: &str = "main.referenceURL";
    pub const TITLE: &str = "main.titleFAQ";
    pub const ADMIN_EMAIL: &str = "main.administrationMail";
    pub const META_DESCRIPTION: &str = "main.metaDescription";
    pub const LANGUAGE: &str = "main.language";
    pub const FORCE_PASSWORD_UPDATE: &str = "security.forcePasswordUpdate";
    pub const SEO_META_HOME: &str = "seo.metaTagsHome";
    pub const SEO_META_FAQS: &str = "seo.metaTagsFaqs";
    pub const SEO_META_CATEGORIES: &str = "seo.metaTagsCategories";
    pub const SEO_META_PAGES: &str = "seo.metaTagsPages";
}

/// A single `(key, value)` configuration row of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

/// Typed view over a tenant's configuration rows.
///
/// Components receive this explicitly instead of reading global state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantSettings {
    values: BTreeMap<String, String>,
}

impl TenantSettings {
    pub fn from_entries(entries: impl IntoIterator<Item = ConfigEntry>) -> Self {
        Self {
            values: entries.into_iter().map(|e| (e.key, e.value)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Boolean flags are stored as the strings `true` / `false` (or `1` / `0`).
    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(|v| v.trim().to_ascii_lowercase()),
            Some(ref v) if v == "true" || v == "1"
        )
    }

    pub fn is_master(&self) -> bool {
        self.flag(keys::IS_MASTER)
    }

    pub fn title(&self) -> &str {
        self.get(keys::TITLE).unwrap_or_default()
    }

    pub fn admin_email(&self) -> &str {
        self.get(keys::ADMIN_EMAIL).unwrap_or_default()
    }

    pub fn meta_description(&self) -> &str {
        self.get(keys::META_DESCRIPTION).unwrap_or_default()
    }

    /// Language code derived from `main.language`, which historically holds
    /// a file name such as `language_en.php`.
    pub fn language(&self) -> String {
        let raw = self.get(keys::LANGUAGE).unwrap_or("en");
        raw.trim_start_matches("language_")
            .trim_end_matches(".php")
            .to_string()
    }

    /// Base URL of the tenant, always ending with `/`.
    pub fn base_url(&self) -> String {
        let url = self.get(keys::REFERENCE_URL).unwrap_or_default();
        if url.is_empty() || url.ends_with('/') {
            url.to_string()
        } else {
            format!("{}/", url)
        }
    }

    pub fn force_password_update(&self) -> bool {
        self.flag(keys::FORCE_PASSWORD_UPDATE)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
