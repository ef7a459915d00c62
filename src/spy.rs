//! Landing-page "spy" tool.
//!
//! Fetches a sales page and pulls out the two things the offer form can
//! pre-fill: the page `<title>` (offer name) and the `og:image` preview
//! (offer image). Uses the synchronous `ureq` client; HTML is parsed with
//! `scraper`.

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::schema::SpyConfig;

/// Largest page body read, in bytes.
const MAX_PAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Metadata scraped from a page. Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpyResult {
    pub title: String,
    pub image_url: String,
}

/// Prefix `https://` when the URL has no http(s) scheme.
pub fn normalize_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        anyhow::bail!("URL is required");
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Ok(format!("https://{url}"))
    }
}

/// Fetch `url` and extract its title and preview image.
pub fn spy(url: &str, config: &SpyConfig) -> Result<SpyResult> {
    let url = normalize_url(url)?;
    info!(%url, "fetching page");

    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(&config.user_agent)
        .build();

    let resp = match agent.get(&url).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(code, resp)) => {
            anyhow::bail!("failed to fetch {url}: HTTP {code} {}", resp.status_text());
        }
        Err(e) => return Err(e).with_context(|| format!("failed to fetch {url}")),
    };

    let html = read_page(resp.into_reader(), MAX_PAGE_BYTES)
        .with_context(|| format!("failed to read body of {url}"))?;

    let result = extract_page_meta(&html);
    debug!(title = %result.title, image = %result.image_url, "extracted page metadata");
    Ok(result)
}

/// Read at most `limit` bytes of a page. Invalid UTF-8 (legacy Latin-1
/// pages, a character split by the limit) is replaced, not rejected.
pub fn read_page(reader: impl Read, limit: u64) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    reader.take(limit).read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Pull `<title>` text and `meta[property="og:image"]` content out of an
/// HTML document.
pub fn extract_page_meta(html: &str) -> SpyResult {
    let doc = Html::parse_document(html);

    let title = first_match(&doc, "title")
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    let image_url = first_match(&doc, r#"meta[property="og:image"]"#)
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    SpyResult { title, image_url }
}

fn first_match<'a>(doc: &'a Html, css: &str) -> Option<scraper::ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector).next()
}
