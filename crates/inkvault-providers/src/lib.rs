//! Site providers for inkvault.
//!
//! One provider per supported external site, behind a shared trait, plus
//! the registry that wires them at process start, the HTTP backend
//! abstraction, and the image fetcher adapter. Providers translate each
//! site's URL shapes, pagination, markup, or encryption scheme into the
//! core domain types; nothing outside this crate knows site specifics.

#![deny(unused_crate_dependencies)]

pub mod error;
pub mod fetcher;
pub mod http;
pub mod provider;
pub mod registry;
pub mod sites;

pub use error::{ProviderError, ProviderResult};
pub use fetcher::ReqwestImageFetcher;
pub use http::{FetchedPayload, HttpBackend, ReqwestBackend};
pub use provider::{Provider, host_matches};
pub use registry::{ProviderRegistry, RegistryError};
pub use sites::{Inkscan, Kagemaru, Paneltoon};

// Silence the unused dev-dependency warning
#[cfg(test)]
use tokio_test as _;
