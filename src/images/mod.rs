use async_trait::async_trait;

pub mod unsplash;

pub use unsplash::UnsplashClient;

/// Seam over the photo lookup so enrichment can be faked in tests.
///
/// Implementations must never fail: a recipe is still worth showing when its
/// photo lookup is not, so every failure degrades to a placeholder URL.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn image_for(&self, title: &str) -> String;
}
