//! The provider trait: one implementation per supported site.

use async_trait::async_trait;
use url::Url;

use inkvault_core::{Chapter, Page, SeriesDetails, SeriesIdentifier};

use crate::error::{ProviderError, ProviderResult};

/// A scraping adapter for one external site.
///
/// Implementations are stateless beyond their HTTP backend and hold no
/// global registration side effects; the registry wires them explicitly
/// at process start.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier used in jobs, records, and the registry.
    fn id(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn base_url(&self) -> &'static str;

    /// Hosts the provider's catalog and reader URLs live on.
    fn site_hosts(&self) -> &'static [&'static str];

    /// Image CDN hosts the provider serves page images from. Used by the
    /// proxy-side host validation.
    fn allowed_image_hosts(&self) -> &'static [&'static str];

    /// Headers sent with catalog/API requests.
    fn request_headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Provider-level headers for image fetches. Per-page overrides win
    /// over these when merged.
    fn image_request_headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Recover a series identity from a URL.
    ///
    /// Pure and infallible: `None` for unrecognized URLs, never an error.
    fn parse_url(&self, url: &Url) -> Option<SeriesIdentifier>;

    /// Fetch the full chapter list for a series, oldest first.
    ///
    /// Paginates internally until the site reports exhaustion and filters
    /// entries the site has not released yet.
    async fn fetch_chapter_list(&self, series_id: &str) -> ProviderResult<Vec<Chapter>>;

    /// Fetch the page image list for one chapter.
    ///
    /// Must reject URLs outside `site_hosts` with `ForeignUrl` and report
    /// an empty page list as `NoPagesFound`.
    async fn fetch_chapter_pages(&self, chapter_url: &str) -> ProviderResult<Vec<Page>>;

    /// Fetch series metadata. Optional capability.
    async fn fetch_series_details(&self, series_id: &str) -> ProviderResult<SeriesDetails> {
        let _ = series_id;
        Err(ProviderError::unsupported(
            "fetch_series_details",
            self.id(),
        ))
    }

    /// Whether `host` is one of this provider's site hosts.
    fn owns_host(&self, host: &str) -> bool {
        self.site_hosts()
            .iter()
            .any(|allowed| host_matches(host, allowed))
    }

    /// Whether `host` is an allowed image host for this provider.
    fn owns_image_host(&self, host: &str) -> bool {
        self.allowed_image_hosts()
            .iter()
            .any(|allowed| host_matches(host, allowed))
    }
}

/// Exact match or subdomain suffix match: `cdn.example.net` matches the
/// allowed host `example.net`, but `evilexample.net` does not.
#[must_use]
pub fn host_matches(host: &str, allowed: &str) -> bool {
    host == allowed
        || (host.len() > allowed.len()
            && host.ends_with(allowed)
            && host.as_bytes()[host.len() - allowed.len() - 1] == b'.')
}

/// Parse `chapter_url` and verify it belongs to `provider`; returns the
/// parsed URL for further path inspection.
pub fn require_owned_url(provider: &dyn Provider, chapter_url: &str) -> ProviderResult<Url> {
    let url = Url::parse(chapter_url)?;
    let host = url.host_str().unwrap_or_default();
    if !provider.owns_host(host) {
        return Err(ProviderError::foreign_url(chapter_url, provider.id()));
    }
    Ok(url)
}
