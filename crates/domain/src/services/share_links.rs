//! Links for sharing a FAQ record.

use serde::Serialize;

/// Identifies the record being shared.
#[derive(Debug, Clone)]
pub struct SharedRecord<'a> {
    pub faq_id: i64,
    pub category_id: i64,
    pub language: &'a str,
    pub question: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinks {
    /// URL-encoded permalink.
    pub link: String,
    pub twitter: String,
    pub send_to_friend: String,
    pub pdf: String,
}

fn faq_url(base_url: &str, record: &SharedRecord<'_>) -> String {
    format!(
        "{}index.php?action=faq&cat={}&id={}&artlang={}",
        base_url,
        record.category_id,
        record.faq_id,
        urlencoding::encode(record.language)
    )
}

/// Builds every share link for `record`. `base_url` must end with `/`.
pub fn share_links(base_url: &str, record: &SharedRecord<'_>) -> ShareLinks {
    let url = faq_url(base_url, record);
    let lang = urlencoding::encode(record.language);

    ShareLinks {
        link: urlencoding::encode(&url).into_owned(),
        twitter: format!(
            "https://twitter.com/share?url={}&text={}{}",
            urlencoding::encode(&url),
            urlencoding::encode(record.question.trim()),
            urlencoding::encode(&format!(" | {}", url))
        ),
        send_to_friend: format!(
            "{}?action=send2friend&cat={}&id={}&artlang={}",
            base_url, record.category_id, record.faq_id, lang
        ),
        pdf: format!(
            "{}pdf.php?cat={}&id={}&artlang={}",
            base_url, record.category_id, record.faq_id, lang
        ),
    }
}
