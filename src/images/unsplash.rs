use async_trait::async_trait;
use anyhow::{Result, anyhow};
use reqwest::Client;
use serde_json::Value;

use super::ImageSearch;

/// Client for the Unsplash photo search endpoint. Asks for a single
/// landscape result per title and degrades to [`placeholder_url`] on any
/// failure, including a missing API key.
#[derive(Debug, Clone)]
pub struct UnsplashClient {
    api_key: Option<String>,
    client: Client,
    base_url: String,
}

/// Deterministic fallback image embedding the recipe title.
pub fn placeholder_url(title: &str) -> String {
    format!(
        "https://via.placeholder.com/400x300/3f3f46/ffffff?text={}",
        urlencoding::encode(title)
    )
}

/// Picks the best image variant out of an Unsplash search response:
/// `results[0].urls.small_s3`, else `.small`, else `.regular`.
pub(crate) fn pick_image_url(data: &Value) -> Option<String> {
    let urls = data
        .get("results")
        .and_then(|r| r.get(0))
        .and_then(|first| first.get("urls"))?;

    ["small_s3", "small", "regular"]
        .iter()
        .find_map(|variant| urls.get(variant).and_then(|u| u.as_str()))
        .map(|s| s.to_string())
}

impl UnsplashClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: Client::new(),
            base_url: "https://api.unsplash.com".to_string(),
        }
    }

    async fn search_photo(&self, title: &str) -> Result<String> {
        let api_key = self.api_key.as_deref()
            .ok_or_else(|| anyhow!("UNSPLASH_KEY not set"))?;

        let url = format!("{}/search/photos", self.base_url);
        let response = self.client
            .get(&url)
            .query(&[
                ("query", title),
                ("per_page", "1"),
                ("orientation", "landscape"),
                ("client_id", api_key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Unsplash request failed with status: {}", response.status()));
        }

        let data: Value = response.json().await?;
        pick_image_url(&data).ok_or_else(|| anyhow!("No image in Unsplash response for {:?}", title))
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    async fn image_for(&self, title: &str) -> String {
        match self.search_photo(title).await {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Unsplash image fetch failed for {:?}: {}", title, e);
                placeholder_url(title)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn picks_small_s3_first() {
        let data = json!({
            "results": [{
                "urls": {
                    "small_s3": "https://img.example/s3.jpg",
                    "small": "https://img.example/small.jpg",
                    "regular": "https://img.example/regular.jpg"
                }
            }]
        });
        assert_eq!(pick_image_url(&data).as_deref(), Some("https://img.example/s3.jpg"));
    }

    #[test]
    fn falls_through_variants_in_order() {
        let data = json!({
            "results": [{ "urls": { "regular": "https://img.example/regular.jpg" } }]
        });
        assert_eq!(pick_image_url(&data).as_deref(), Some("https://img.example/regular.jpg"));
    }

    #[test]
    fn empty_results_yield_none() {
        assert_eq!(pick_image_url(&json!({ "results": [] })), None);
        assert_eq!(pick_image_url(&json!({})), None);
    }

    #[test]
    fn placeholder_embeds_encoded_title() {
        let url = placeholder_url("Mac & Cheese");
        assert!(url.contains("Mac%20%26%20Cheese"), "unexpected url: {}", url);
    }

    #[tokio::test]
    async fn missing_key_degrades_to_placeholder() {
        let client = UnsplashClient::new(None);
        let url = client.image_for("Tomato Soup").await;
        assert_eq!(url, placeholder_url("Tomato Soup"));
    }
}
