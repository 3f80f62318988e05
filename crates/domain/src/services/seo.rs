//! Search engine meta tags.

use crate::models::config::{keys, TenantSettings};

/// Value of the `robots` meta tag for a page action.
pub fn meta_robots<'a>(settings: &'a TenantSettings, action: &str) -> &'a str {
    let key = match action {
        "main" => keys::SEO_META_HOME,
        "faq" => keys::SEO_META_FAQS,
        "show" => keys::SEO_META_CATEGORIES,
        _ => keys::SEO_META_PAGES,
    };
    settings.get(key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ConfigEntry;

    fn settings() -> TenantSettings {
        TenantSettings::from_entries(
            [
                (keys::SEO_META_HOME, "index, follow"),
                (keys::SEO_META_FAQS, "index, nofollow"),
                (keys::SEO_META_CATEGORIES, "noindex, follow"),
                (keys::SEO_META_PAGES, "noindex, nofollow"),
            ]
            .into_iter()
            .map(|(k, v)| ConfigEntry {
                key: k.to_string(),
                value: v.to_string(),
            }),
        )
    }

    #[test]
    fn test_meta_robots_by_action() {
        let s = settings();
        assert_eq!(meta_robots(&s, "main"), "index, follow");
        assert_eq!(meta_robots(&s, "faq"), "index, nofollow");
        assert_eq!(meta_robots(&s, "show"), "noindex, follow");
        assert_eq!(meta_robots(&s, "search"), "noindex, nofollow");
        assert_eq!(meta_robots(&s, ""), "noindex, nofollow");
    }

    #[test]
    fn test_meta_robots_unset() {
        assert_eq!(meta_robots(&TenantSettings::default(), "main"), "");
    }
}
