//! inkscan.io provider.
//!
//! The site ships no JSON API; chapter listings and reader pages are
//! recovered by scanning raw markup. The markup assumptions are explicit:
//!
//! - chapter links are anchors carrying `class="chapter-link"` with an
//!   `href` of the form `/comic/{slug}/chapter-{n}` and the chapter title
//!   in a `title` attribute;
//! - reader images are `<img>` tags carrying `class="reader-page"` with
//!   the real source in a `data-src` attribute (the `src` is a
//!   lazy-loading placeholder).
//!
//! Markup drift yields zero matches, which surfaces as `NoPagesFound`
//! upstream rather than a crash.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use inkvault_core::{Chapter, Page, SeriesIdentifier};

use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpBackend;
use crate::provider::{Provider, require_owned_url};

const SITE_HOSTS: &[&str] = &["inkscan.io"];
const IMAGE_HOSTS: &[&str] = &["inkscan.io", "cdn.inkscan.io"];
const BASE_URL: &str = "https://inkscan.io";

pub struct Inkscan {
    http: Arc<dyn HttpBackend>,
}

impl Inkscan {
    #[must_use]
    pub fn new(http: Arc<dyn HttpBackend>) -> Self {
        Self { http }
    }
}

/// Collect the attribute region of every tag starting with `marker`,
/// up to the closing `>`.
fn tag_bodies<'a>(html: &'a str, marker: &str) -> Vec<&'a str> {
    let mut bodies = Vec::new();
    let mut rest = html;
    while let Some(pos) = rest.find(marker) {
        let after = &rest[pos + marker.len()..];
        let end = after.find('>').unwrap_or(after.len());
        bodies.push(&after[..end]);
        rest = &after[end..];
    }
    bodies
}

/// Extract a double-quoted attribute value from a tag body.
fn attr_value<'a>(tag: &'a str, attr: &str) -> Option<&'a str> {
    let needle = format!("{attr}=\"");
    let start = tag.find(&needle)? + needle.len();
    let rest = &tag[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Parse the trailing chapter number out of an href like
/// `/comic/slug/chapter-12`.
fn chapter_number_from_href(href: &str) -> Option<u32> {
    let tail = href.trim_end_matches('/').rsplit('/').next()?;
    tail.strip_prefix("chapter-")?.parse().ok()
}

fn absolute_url(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(String::from)
}

#[async_trait]
impl Provider for Inkscan {
    fn id(&self) -> &'static str {
        "inkscan"
    }

    fn display_name(&self) -> &'static str {
        "InkScan"
    }

    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn site_hosts(&self) -> &'static [&'static str] {
        SITE_HOSTS
    }

    fn allowed_image_hosts(&self) -> &'static [&'static str] {
        IMAGE_HOSTS
    }

    fn image_request_headers(&self) -> Vec<(String, String)> {
        vec![("Referer".to_string(), "https://inkscan.io/".to_string())]
    }

    fn parse_url(&self, url: &Url) -> Option<SeriesIdentifier> {
        let host = url.host_str()?;
        if !self.owns_host(host) {
            return None;
        }
        let mut segments = url.path_segments()?;
        if segments.next()? != "comic" {
            return None;
        }
        let slug = segments.next()?;
        if slug.is_empty() || segments.next().is_some() {
            return None;
        }
        Some(SeriesIdentifier::new(self.id(), slug, url.as_str()))
    }

    async fn fetch_chapter_list(&self, series_id: &str) -> ProviderResult<Vec<Chapter>> {
        let url = Url::parse(&format!("{BASE_URL}/comic/{series_id}"))?;
        let html = self.http.get_text(&url, &self.request_headers()).await?;

        let mut chapters = Vec::new();
        for tag in tag_bodies(&html, "<a ") {
            let class = attr_value(tag, "class").unwrap_or_default();
            if !class.split_whitespace().any(|c| c == "chapter-link") {
                continue;
            }
            let Some(href) = attr_value(tag, "href") else {
                continue;
            };
            let Some(number) = chapter_number_from_href(href) else {
                continue;
            };
            let Some(chapter_url) = absolute_url(&url, href) else {
                continue;
            };

            let title = attr_value(tag, "title")
                .map_or_else(|| format!("Chapter {number}"), ToString::to_string);

            chapters.push(Chapter {
                id: format!("{series_id}/chapter-{number}"),
                number,
                title,
                url: chapter_url,
                // The site renders relative dates only
                date_published: None,
                is_locked: None,
            });
        }

        chapters.sort_by_key(|c| c.number);
        chapters.dedup_by_key(|c| c.number);
        Ok(chapters)
    }

    async fn fetch_chapter_pages(&self, chapter_url: &str) -> ProviderResult<Vec<Page>> {
        let url = require_owned_url(self, chapter_url)?;
        let html = self.http.get_text(&url, &self.request_headers()).await?;

        let mut pages = Vec::new();
        for tag in tag_bodies(&html, "<img") {
            let class = attr_value(tag, "class").unwrap_or_default();
            if !class.split_whitespace().any(|c| c == "reader-page") {
                continue;
            }
            let Some(src) = attr_value(tag, "data-src") else {
                continue;
            };
            if let Some(page_url) = absolute_url(&url, src) {
                pages.push(Page::new(page_url));
            }
        }

        if pages.is_empty() {
            return Err(ProviderError::no_pages_found(chapter_url));
        }
        Ok(pages)
    }
}
