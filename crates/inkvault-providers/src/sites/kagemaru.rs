//! kagemaru.app provider.
//!
//! Every API call is signed with a freshly minted device token. The server
//! derives an AES-256-CBC key and IV from SHA-256 over the token, the
//! request timestamp, and a fixed catalog salt, and encrypts the response
//! body with them (base64 on the wire). Image URLs for locked page groups
//! arrive individually encrypted under a different salt and must be
//! decrypted with the token of the very call that returned them; tokens are
//! per-call and never reused, so each page carries its paired token as a
//! header override for the CDN.

use std::sync::Arc;

use aes::cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use inkvault_core::{Chapter, Page, SeriesIdentifier};

use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpBackend;
use crate::provider::{Provider, require_owned_url};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const SITE_HOSTS: &[&str] = &["kagemaru.app"];
const IMAGE_HOSTS: &[&str] = &["kagemaru.app", "img.kagemaru.app"];
const API_BASE: &str = "https://api.kagemaru.app/v2";
const READER_BASE: &str = "https://kagemaru.app";

// Fixed salts baked into the site's web client
const CATALOG_SALT: &str = "kgm.catalog.9f2a77c1";
const IMAGE_SALT: &str = "kgm.image.41d0b8ee";

/// Header carrying the device token an image URL was unlocked with.
const DEVICE_TOKEN_HEADER: &str = "X-Kgm-Device";

pub struct Kagemaru {
    http: Arc<dyn HttpBackend>,
}

/// Token/timestamp pair a signed call was made with. Key material for
/// anything returned by that call derives from exactly this pair.
struct CallSignature {
    token: String,
    timestamp: i64,
}

fn mint_device_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn derive_key_iv(token: &str, timestamp: i64, salt: &str) -> ([u8; 32], [u8; 16]) {
    let key: [u8; 32] = Sha256::digest(format!("{token}{timestamp}{salt}")).into();
    let iv_digest = Sha256::digest(format!("{salt}{timestamp}{token}"));
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&iv_digest[..16]);
    (key, iv)
}

fn decrypt_payload(body: &str, sig: &CallSignature, salt: &str) -> ProviderResult<Vec<u8>> {
    let data = BASE64
        .decode(body.trim())
        .map_err(|e| ProviderError::decrypt(format!("base64: {e}")))?;
    let (key, iv) = derive_key_iv(&sig.token, sig.timestamp, salt);
    Aes256CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&data)
        .map_err(|e| ProviderError::decrypt(format!("cbc: {e}")))
}

fn decrypt_image_url(cipher_b64: &str, sig: &CallSignature) -> ProviderResult<String> {
    let plain = decrypt_payload(cipher_b64, sig, IMAGE_SALT)?;
    String::from_utf8(plain).map_err(|e| ProviderError::decrypt(format!("utf8: {e}")))
}

fn parse_published_at(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
struct ChapterListResponse {
    chapters: Vec<ChapterEntry>,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct ChapterEntry {
    id: String,
    number: u32,
    title: String,
    published_at: Option<String>,
    #[serde(default = "default_released")]
    released: bool,
    locked: Option<bool>,
}

const fn default_released() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct PageManifest {
    #[serde(default)]
    pages: Vec<PlainPage>,
    locked_group: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlainPage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct LockedGroup {
    images: Vec<String>,
}

impl Kagemaru {
    #[must_use]
    pub fn new(http: Arc<dyn HttpBackend>) -> Self {
        Self { http }
    }

    /// Make a signed API call: mint a token, stamp the request, decrypt the
    /// response body with the catalog salt.
    async fn signed_json(
        &self,
        path_and_query: &str,
    ) -> ProviderResult<(serde_json::Value, CallSignature)> {
        let sig = CallSignature {
            token: mint_device_token(),
            timestamp: Utc::now().timestamp(),
        };
        let sep = if path_and_query.contains('?') { '&' } else { '?' };
        let url = Url::parse(&format!(
            "{API_BASE}{path_and_query}{sep}dt={}&ts={}",
            sig.token, sig.timestamp,
        ))?;

        let body = self.http.get_text(&url, &self.request_headers()).await?;
        let plain = decrypt_payload(&body, &sig, CATALOG_SALT)?;
        let value = serde_json::from_slice(&plain)?;
        Ok((value, sig))
    }
}

#[async_trait]
impl Provider for Kagemaru {
    fn id(&self) -> &'static str {
        "kagemaru"
    }

    fn display_name(&self) -> &'static str {
        "Kagemaru"
    }

    fn base_url(&self) -> &'static str {
        READER_BASE
    }

    fn site_hosts(&self) -> &'static [&'static str] {
        SITE_HOSTS
    }

    fn allowed_image_hosts(&self) -> &'static [&'static str] {
        IMAGE_HOSTS
    }

    fn image_request_headers(&self) -> Vec<(String, String)> {
        vec![("Referer".to_string(), "https://kagemaru.app/".to_string())]
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
        Some(SeriesIdentifier::new(self.id(), id, url.as_str()))
    }

    async fn fetch_chapter_list(&self, series_id: &str) -> ProviderResult<Vec<Chapter>> {
        let mut chapters = Vec::new();
        let mut page = 1u32;
        loop {
            let path = format!(
                "/series/{}/chapters?page={page}",
                urlencoding::encode(series_id)
            );
            let (value, _sig) = self.signed_json(&path).await?;
            let response: ChapterListResponse = serde_json::from_value(value)?;

            for entry in response.chapters {
                if !entry.released {
                    continue;
                }
                chapters.push(Chapter {
                    url: format!("{READER_BASE}/read/{series_id}/{}", entry.id),
                    id: entry.id,
                    number: entry.number,
                    title: entry.title,
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
        let chapter_id = match url.path_segments().map(|s| s.collect::<Vec<_>>()) {
            Some(segments) if segments.len() == 3 && segments[0] == "read" => {
                segments[2].to_string()
            }
            _ => {
                return Err(ProviderError::invalid_response(format!(
                    "not a reader URL: {chapter_url}"
                )));
            }
        };

        let (value, sig) = self
            .signed_json(&format!("/chapters/{chapter_id}/pages"))
            .await?;
        let manifest: PageManifest = serde_json::from_value(value)?;

        let mut pages: Vec<Page> = manifest
            .pages
            .into_iter()
            .map(|p| {
                Page::with_headers(
                    p.url,
                    vec![(DEVICE_TOKEN_HEADER.to_string(), sig.token.clone())],
                )
            })
            .collect();

        if let Some(group_id) = manifest.locked_group {
            // The unlock call mints its own token; the URLs it returns are
            // only decryptable (and only fetchable) with that token.
            let (value, group_sig) = self
                .signed_json(&format!("/groups/{group_id}/images"))
                .await?;
            let group: LockedGroup = serde_json::from_value(value)?;
            for cipher in group.images {
                let image_url = decrypt_image_url(&cipher, &group_sig)?;
                pages.push(Page::with_headers(
                    image_url,
                    vec![(DEVICE_TOKEN_HEADER.to_string(), group_sig.token.clone())],
                ));
            }
        }

        if pages.is_empty() {
            return Err(ProviderError::no_pages_found(chapter_url));
        }
        Ok(pages)
    }
}
