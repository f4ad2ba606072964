//! Provider registry.
//!
//! Providers are registered explicitly at process start; there is no
//! import-time self-registration, so construction order is visible in one
//! place and tests can build registries with any subset of providers.

use std::sync::Arc;

use thiserror::Error;
use url::Url;

use inkvault_core::SeriesIdentifier;

use crate::http::{HttpBackend, ReqwestBackend};
use crate::provider::Provider;
use crate::sites::{Inkscan, Kagemaru, Paneltoon};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("provider already registered: {provider_id}")]
    DuplicateProvider { provider_id: String },
}

/// Registry of all configured providers.
///
/// Iteration order is registration order; `identify` returns the first
/// provider that recognizes a URL.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Build a registry with every supported site wired to a shared
    /// reqwest backend.
    #[must_use]
    pub fn with_default_providers() -> Self {
        let http: Arc<dyn HttpBackend> = Arc::new(ReqwestBackend::new());
        Self {
            providers: vec![
                Arc::new(Paneltoon::new(Arc::clone(&http))),
                Arc::new(Inkscan::new(Arc::clone(&http))),
                Arc::new(Kagemaru::new(http)),
            ],
        }
    }

    /// Register a provider. Fails if its id is already taken.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<(), RegistryError> {
        if self.providers.iter().any(|p| p.id() == provider.id()) {
            return Err(RegistryError::DuplicateProvider {
                provider_id: provider.id().to_string(),
            });
        }
        self.providers.push(provider);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|p| p.id() == provider_id)
            .cloned()
    }

    /// Identify which provider and series a URL points at.
    ///
    /// Invalid URLs and URLs no provider recognizes both yield `None`.
    #[must_use]
    pub fn identify(&self, url: &str) -> Option<SeriesIdentifier> {
        let parsed = Url::parse(url).ok()?;
        self.providers.iter().find_map(|p| p.parse_url(&parsed))
    }

    /// Find the provider whose image hosts cover `url`, for proxy-side
    /// validation of image requests.
    #[must_use]
    pub fn validate_image_host(&self, url: &str) -> Option<Arc<dyn Provider>> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        self.providers
            .iter()
            .find(|p| p.owns_image_host(host))
            .cloned()
    }

    #[must_use]
    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeBackend;

    fn registry_with_fakes() -> ProviderRegistry {
        let http: Arc<dyn HttpBackend> = Arc::new(FakeBackend::new());
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(Paneltoon::new(Arc::clone(&http))))
            .unwrap();
        registry
            .register(Arc::new(Inkscan::new(Arc::clone(&http))))
            .unwrap();
        registry.register(Arc::new(Kagemaru::new(http))).unwrap();
        registry
    }

    #[test]
    fn test_register_rejects_duplicate_id() {
        let http: Arc<dyn HttpBackend> = Arc::new(FakeBackend::new());
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(Paneltoon::new(Arc::clone(&http))))
            .unwrap();

        let err = registry
            .register(Arc::new(Paneltoon::new(http)))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateProvider {
                provider_id: "paneltoon".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_by_id() {
        let registry = registry_with_fakes();
        assert!(registry.get("inkscan").is_some());
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_identify_routes_to_owning_provider() {
        let registry = registry_with_fakes();

        let id = registry
            .identify("https://paneltoon.net/series/9913")
            .unwrap();
        assert_eq!(id.provider_id, "paneltoon");

        let id = registry
            .identify("https://inkscan.io/comic/long-night")
            .unwrap();
        assert_eq!(id.provider_id, "inkscan");
        assert_eq!(id.series_id, "long-night");
    }

    #[test]
    fn test_identify_unknown_and_invalid_urls() {
        let registry = registry_with_fakes();
        assert!(registry.identify("https://unrelated.example/series/1").is_none());
        assert!(registry.identify("not a url").is_none());
    }

    #[test]
    fn test_validate_image_host() {
        let registry = registry_with_fakes();

        let provider = registry
            .validate_image_host("https://img.paneltoon.net/p/1.jpg")
            .unwrap();
        assert_eq!(provider.id(), "paneltoon");

        assert!(
            registry
                .validate_image_host("https://img.unrelated.example/p/1.jpg")
                .is_none()
        );
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let registry = registry_with_fakes();
        assert_eq!(registry.provider_ids(), vec!["paneltoon", "inkscan", "kagemaru"]);
    }
}
