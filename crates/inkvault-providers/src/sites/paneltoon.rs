//! paneltoon.net provider.
//!
//! Clean JSON API. The episode listing is paginated via a `page` query
//! parameter and a `has_more` flag; episodes with the `scheduled` flag set
//! are visible in the API before their release date and must be filtered
//! out. Titles hosted on the `challenge.paneltoon.net` subdomain use the
//! same API with a `challenge` flag, which we fold into the series id with
//! a provider-private `|c` suffix so the rest of the system can treat the
//! id as opaque.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use inkvault_core::{Chapter, Page, SeriesDetails, SeriesIdentifier};

use crate::error::ProviderResult;
use crate::http::HttpBackend;
use crate::provider::{Provider, require_owned_url};

const SITE_HOSTS: &[&str] = &["paneltoon.net", "challenge.paneltoon.net"];
const IMAGE_HOSTS: &[&str] = &["paneltoon.net", "img.paneltoon.net"];
const API_BASE: &str = "https://paneltoon.net/api/v1";

/// Suffix marking a challenge-hosted title inside the opaque series id.
const CHALLENGE_SUFFIX: &str = "|c";

pub struct Paneltoon {
    http: Arc<dyn HttpBackend>,
}

impl Paneltoon {
    #[must_use]
    pub fn new(http: Arc<dyn HttpBackend>) -> Self {
        Self { http }
    }

    fn episodes_url(series: &SeriesRef<'_>, page: u32) -> ProviderResult<Url> {
        let url = format!(
            "{API_BASE}/series/{}/episodes?page={page}&challenge={}",
            urlencoding::encode(series.id),
            series.challenge,
        );
        Ok(Url::parse(&url)?)
    }

    fn viewer_url(series: &SeriesRef<'_>, episode_id: u64) -> String {
        let host = if series.challenge {
            "challenge.paneltoon.net"
        } else {
            "paneltoon.net"
        };
        format!("https://{host}/viewer/{}/{episode_id}", series.id)
    }
}

/// Decoded form of the opaque series id.
struct SeriesRef<'a> {
    id: &'a str,
    challenge: bool,
}

fn split_series_id(series_id: &str) -> SeriesRef<'_> {
    series_id.strip_suffix(CHALLENGE_SUFFIX).map_or(
        SeriesRef {
            id: series_id,
            challenge: false,
        },
        |id| SeriesRef {
            id,
            challenge: true,
        },
    )
}

#[derive(Debug, Deserialize)]
struct EpisodePage {
    episodes: Vec<EpisodeEntry>,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct EpisodeEntry {
    id: u64,
    seq: u32,
    title: String,
    published_at: Option<String>,
    #[serde(default)]
    scheduled: bool,
    locked: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SeriesInfo {
    title: String,
    author: Option<String>,
    description: Option<String>,
    cover_url: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageManifest {
    images: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    url: String,
}

fn parse_published_at(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

#[async_trait]
impl Provider for Paneltoon {
    fn id(&self) -> &'static str {
        "paneltoon"
    }

    fn display_name(&self) -> &'static str {
        "Paneltoon"
    }

    fn base_url(&self) -> &'static str {
        "https://paneltoon.net"
    }

    fn site_hosts(&self) -> &'static [&'static str] {
        SITE_HOSTS
    }

    fn allowed_image_hosts(&self) -> &'static [&'static str] {
        IMAGE_HOSTS
    }

    fn image_request_headers(&self) -> Vec<(String, String)> {
        vec![(
            "Referer".to_string(),
            "https://paneltoon.net/".to_string(),
        )]
    }

    fn parse_url(&self, url: &Url) -> Option<SeriesIdentifier> {
        let host = url.host_str()?;
        if !self.owns_host(host) {
            return None;
        }
        let mut segments = url.path_segments()?;
        if segments.next()? != "series" {
            return None;
        }
        let id = segments.next()?;
        if id.is_empty() || segments.next().is_some() {
            return None;
        }

        let series_id = if host == "challenge.paneltoon.net" {
            format!("{id}{CHALLENGE_SUFFIX}")
        } else {
            id.to_string()
        };
        Some(SeriesIdentifier::new(self.id(), series_id, url.as_str()))
    }

    async fn fetch_chapter_list(&self, series_id: &str) -> ProviderResult<Vec<Chapter>> {
        let series = split_series_id(series_id);
        let headers = self.request_headers();

        let mut chapters = Vec::new();
        let mut page = 1u32;
        loop {
            let url = Self::episodes_url(&series, page)?;
            let value = self.http.get_json(&url, &headers).await?;
            let response: EpisodePage = serde_json::from_value(value)?;

            for entry in response.episodes {
                if entry.scheduled {
                    continue;
                }
                chapters.push(Chapter {
                    id: entry.id.to_string(),
                    number: entry.seq,
                    title: entry.title,
                    url: Self::viewer_url(&series, entry.id),
                    date_published: parse_published_at(entry.published_at.as_deref()),
                    is_locked: entry.locked,
                });
            }

            if !response.has_more {
                break;
            }
            page += 1;
        }

        chapters.sort_by_key(|c| c.number);
        Ok(chapters)
    }

    async fn fetch_chapter_pages(&self, chapter_url: &str) -> ProviderResult<Vec<Page>> {
        let url = require_owned_url(self, chapter_url)?;

        // Viewer URLs look like /viewer/{series}/{episode_id}; the image
        // manifest is keyed by episode id alone.
        let episode_id = url
            .path_segments()
            .and_then(|mut s| {
                if s.next() == Some("viewer") {
                    s.nth(1)
                } else {
                    None
                }
            })
            .ok_or_else(|| {
                crate::error::ProviderError::invalid_response(format!(
                    "not a viewer URL: {chapter_url}"
                ))
            })?;

        let manifest_url = Url::parse(&format!("{API_BASE}/episodes/{episode_id}/images"))?;
        let value = self
            .http
            .get_json(&manifest_url, &self.request_headers())
            .await?;
        let manifest: ImageManifest = serde_json::from_value(value)?;
        if manifest.images.is_empty() {
            return Err(crate::error::ProviderError::no_pages_found(chapter_url));
        }

        Ok(manifest
            .images
            .into_iter()
            .map(|entry| Page::new(entry.url))
            .collect())
    }

    async fn fetch_series_details(&self, series_id: &str) -> ProviderResult<SeriesDetails> {
        let series = split_series_id(series_id);
        let url = Url::parse(&format!(
            "{API_BASE}/series/{}?challenge={}",
            urlencoding::encode(series.id),
            series.challenge,
        ))?;
        let value = self.http.get_json(&url, &self.request_headers()).await?;
        let info: SeriesInfo = serde_json::from_value(value)?;

        Ok(SeriesDetails {
            title: info.title,
            author: info.author,
            description: info.description,
            cover_url: info.cover_url,
            status: info.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ProviderError;
    use crate::http::testing::FakeBackend;

    fn provider(backend: FakeBackend) -> Paneltoon {
        Paneltoon::new(Arc::new(backend))
    }

    #[test]
    fn test_parse_url_table() {
        let p = provider(FakeBackend::new());
        let cases = [
            ("https://paneltoon.net/series/9913", Some("9913")),
            ("https://www.paneltoon.net/series/9913", Some("9913")),
            ("https://challenge.paneltoon.net/series/77", Some("77|c")),
            ("https://paneltoon.net/series/", None),
            ("https://paneltoon.net/viewer/9913/1", None),
            ("https://other.example/series/9913", None),
        ];

        for (input, expected) in cases {
            let url = Url::parse(input).unwrap();
            let parsed = p.parse_url(&url);
            assert_eq!(
                parsed.as_ref().map(|s| s.series_id.as_str()),
                expected,
                "case: {input}"
            );
        }
    }

    #[tokio::test]
    async fn test_chapter_list_paginates_until_exhausted() {
        let backend = FakeBackend::new()
            .with_json(
                "page=1",
                json!({
                    "episodes": [
                        {"id": 201, "seq": 2, "title": "Episode 2", "published_at": "2024-01-08T00:00:00Z"},
                        {"id": 200, "seq": 1, "title": "Episode 1", "published_at": "2024-01-01T00:00:00Z"},
                    ],
                    "has_more": true
                }),
            )
            .with_json(
                "page=2",
                json!({
                    "episodes": [
                        {"id": 202, "seq": 3, "title": "Episode 3", "published_at": null, "locked": true},
                    ],
                    "has_more": false
                }),
            );
        let p = provider(backend);

        let chapters = p.fetch_chapter_list("9913").await.unwrap();
        assert_eq!(chapters.len(), 3);
        // Oldest first regardless of API order
        assert_eq!(
            chapters.iter().map(|c| c.number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(chapters[0].url, "https://paneltoon.net/viewer/9913/200");
        assert_eq!(chapters[2].is_locked, Some(true));
        assert!(chapters[0].date_published.is_some());
        assert!(chapters[2].date_published.is_none());
    }

    #[tokio::test]
    async fn test_chapter_list_filters_scheduled_episodes() {
        let backend = FakeBackend::new().with_json(
            "episodes",
            json!({
                "episodes": [
                    {"id": 1, "seq": 1, "title": "Out now"},
                    {"id": 2, "seq": 2, "title": "Next week", "scheduled": true},
                ],
                "has_more": false
            }),
        );
        let p = provider(backend);

        let chapters = p.fetch_chapter_list("9913").await.unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Out now");
    }

    #[tokio::test]
    async fn test_challenge_series_id_sets_flag_and_host() {
        let backend = FakeBackend::new().with_handler("episodes", |url| {
            assert!(url.query().unwrap().contains("challenge=true"));
            crate::http::testing::Canned::Json(json!({
                "episodes": [{"id": 5, "seq": 1, "title": "Episode 1"}],
                "has_more": false
            }))
        });
        let p = provider(backend);

        let chapters = p.fetch_chapter_list("77|c").await.unwrap();
        assert_eq!(
            chapters[0].url,
            "https://challenge.paneltoon.net/viewer/77/5"
        );
    }

    #[tokio::test]
    async fn test_fetch_pages_from_viewer_url() {
        let backend = FakeBackend::new().with_json(
            "episodes/200/images",
            json!({
                "images": [
                    {"url": "https://img.paneltoon.net/9913/200/1.jpg"},
                    {"url": "https://img.paneltoon.net/9913/200/2.jpg"},
                ]
            }),
        );
        let p = provider(backend);

        let pages = p
            .fetch_chapter_pages("https://paneltoon.net/viewer/9913/200")
            .await
            .unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].url, "https://img.paneltoon.net/9913/200/1.jpg");
        assert!(pages[0].headers.is_none());
    }

    #[tokio::test]
    async fn test_fetch_pages_rejects_foreign_url() {
        let p = provider(FakeBackend::new());
        let err = p
            .fetch_chapter_pages("https://other.example/viewer/9913/200")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ForeignUrl { .. }));
    }

    #[tokio::test]
    async fn test_non_success_status_is_unavailable() {
        let backend = FakeBackend::new().with_status("episodes", 503);
        let p = provider(backend);

        let err = p.fetch_chapter_list("9913").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_series_details() {
        let backend = FakeBackend::new().with_json(
            "series/9913",
            json!({
                "title": "The Long Night",
                "author": "K. Aoyama",
                "description": "A story.",
                "cover_url": "https://img.paneltoon.net/9913/cover.jpg",
                "status": "ongoing"
            }),
        );
        let p = provider(backend);

        let details = p.fetch_series_details("9913").await.unwrap();
        assert_eq!(details.title, "The Long Night");
        assert_eq!(details.status.as_deref(), Some("ongoing"));
    }
}
