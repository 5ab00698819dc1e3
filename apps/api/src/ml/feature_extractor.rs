use crate::{error::Result, ml::similarity::Embedding};
use async_trait::async_trait;

/// Maps an image reference to a fixed-length visual embedding.
///
/// Implementations are constructed once at startup and shared across
/// requests; any caching is their own business.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    async fn extract(&self, image_url: &str) -> Result<Embedding>;

    /// Bring the backing model up before the first request. Returns whether
    /// any warm-up work was done.
    async fn prewarm(&self) -> Result<bool> {
        Ok(false)
    }
}
