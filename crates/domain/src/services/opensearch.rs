//! OpenSearch description document for a tenant.

use crate::models::config::TenantSettings;

pub const CONTENT_TYPE: &str = "application/opensearchdescription+xml";

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders the descriptor; `{searchTerms}` is left for the browser to fill.
pub fn descriptor(settings: &TenantSettings) -> String {
    let base_url = settings.base_url();
    let template = format!("{}index.php?action=search&search={{searchTerms}}", base_url);
    let image = format!("{}/assets/img/pmfsearch.png", base_url.trim_end_matches('/'));

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<OpenSearchDescription xmlns="http://a9.com/-/spec/opensearch/1.1/">
 <ShortName>{short_name}</ShortName>
 <Description>{description}</Description>
 <Url type="text/html" template="{template}"/>
 <Language>{language}</Language>
 <OutputEncoding>utf-8</OutputEncoding>
 <Contact>{contact}</Contact>
 <Image height="16" width="16" type="image/png">{image}</Image>
</OpenSearchDescription>
"#,
        short_name = escape(settings.title()),
        description = escape(settings.meta_description()),
        template = escape(&template),
        language = escape(&settings.language()),
        contact = escape(settings.admin_email()),
        image = escape(&image),
    )
}
