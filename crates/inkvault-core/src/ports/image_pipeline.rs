//! Image pipeline port.
//!
//! Fetched page images pass through the pipeline (recompression, format
//! normalization) before being handed to the store. The pipeline is a pure
//! transformation: same input, same output, no retained state.

use async_trait::async_trait;
use thiserror::Error;

/// Result of optimizing one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("image pipeline failed: {message}")]
pub struct ImagePipelineError {
    pub message: String,
}

impl ImagePipelineError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ImagePipelinePort: Send + Sync {
    async fn optimize(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<OptimizedImage, ImagePipelineError>;
}

/// Pass-through pipeline for tests and contexts without an optimizer.
#[derive(Debug, Clone, Default)]
pub struct NoopImagePipeline;

impl NoopImagePipeline {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImagePipelinePort for NoopImagePipeline {
    async fn optimize(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<OptimizedImage, ImagePipelineError> {
        Ok(OptimizedImage {
            bytes,
            content_type: content_type.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_pipeline_passes_bytes_through() {
        let pipeline = NoopImagePipeline::new();
        let out = pipeline
            .optimize(vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(out.bytes, vec![1, 2, 3]);
        assert_eq!(out.content_type, "image/png");
    }
}
