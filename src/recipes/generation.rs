use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use thiserror::Error;

use crate::images::ImageSearch;
use crate::providers::traits::ChatCompletion;
use super::model::{normalize_candidates, Recipe};

/// Fixed instruction constraining the model to a bare JSON array of recipes.
pub const SYSTEM_PROMPT: &str = "\
You are a recipe assistant. The user will provide a general description. \
You must return ONLY a JSON array of 3 recipes that match. \
Each recipe object must follow this exact shape: \
{ \"id\": \"slug of the title, e.g. mashed-potatoes\", \"title\": string, \
\"prepTime\": string, \"ingredients\": [string], \"instructions\": [string], \
\"imageUrl\": string }. \
Do not include any text, explanation, or markdown formatting outside of the JSON array. \
Return a placeholder imageUrl like: \
\"https://via.placeholder.com/400x300/3f3f46/ffffff?text=Recipe+Image\"";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("GROQ_API_KEY is not set; recipe search is unavailable")]
    MissingApiKey,
}

/// Seam the query controller depends on: a prompt in, a finished result set
/// out. The only error is the missing credential; upstream trouble surfaces
/// as an empty list.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<Recipe>, GenerationError>;
}

/// Turns a free-text craving into an enriched recipe list: one completion
/// call, tolerant array extraction, parse + normalize, then a photo per
/// candidate.
pub struct RecipeGenerator<P, I> {
    provider: Option<Arc<P>>,
    images: Arc<I>,
}

/// Locates the first top-level JSON array substring within model output
/// (first `[` through last `]`). The model is told to emit a bare array but
/// often wraps it in prose or a markdown fence; this is a deliberate
/// tolerance, not a strict parser.
pub fn extract_json_array(content: &str) -> Option<&str> {
    let start = content.find('[')?;
    let end = content.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&content[start..=end])
}

impl<P, I> RecipeGenerator<P, I>
where
    P: ChatCompletion,
    I: ImageSearch,
{
    /// `provider` is `None` when the model-service credential is absent;
    /// every search then fails fast without touching the network.
    pub fn new(provider: Option<P>, images: I) -> Self {
        Self {
            provider: provider.map(Arc::new),
            images: Arc::new(images),
        }
    }

    async fn try_generate(&self, provider: &P, prompt: &str) -> Result<Vec<Recipe>> {
        let content = provider.complete(prompt).await?;

        let json = extract_json_array(&content)
            .ok_or_else(|| anyhow!("model output contained no JSON array: {:?}", content))?;

        let candidates: Vec<Recipe> = serde_json::from_str(json)
            .context("model output was not a valid recipe array")?;

        let mut recipes = normalize_candidates(candidates);

        // One lookup at a time, in model order. Lookups never fail; a bad
        // one degrades to a placeholder inside the image client.
        for recipe in &mut recipes {
            recipe.image_url = Some(self.images.image_for(&recipe.title).await);
        }

        Ok(recipes)
    }
}

#[async_trait]
impl<P, I> RecipeSource for RecipeGenerator<P, I>
where
    P: ChatCompletion,
    I: ImageSearch,
{
    async fn generate(&self, prompt: &str) -> Result<Vec<Recipe>, GenerationError> {
        let provider = self.provider.as_ref().ok_or(GenerationError::MissingApiKey)?;

        match self.try_generate(provider, prompt).await {
            Ok(recipes) => Ok(recipes),
            Err(e) => {
                log::error!("recipe generation failed for {:?}: {:#}", prompt, e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::unsplash::placeholder_url;
    use anyhow::anyhow;

    const THREE_RECIPES: &str = r#"[
        {"id": "spaghetti-carbonara", "title": "Spaghetti Carbonara", "prepTime": "25 min",
         "ingredients": ["spaghetti", "eggs", "guanciale"],
         "instructions": ["boil pasta", "fry guanciale", "toss with egg"],
         "imageUrl": "https://via.placeholder.com/400x300/3f3f46/ffffff?text=Recipe+Image"},
        {"id": "pasta-primavera", "title": "Pasta Primavera", "prepTime": "30 min",
         "ingredients": ["penne", "vegetables"],
         "instructions": ["roast vegetables", "combine"],
         "imageUrl": "https://via.placeholder.com/400x300/3f3f46/ffffff?text=Recipe+Image"},
        {"id": "pesto-gnocchi", "title": "Pesto Gnocchi", "prepTime": "20 min",
         "ingredients": ["gnocchi", "basil", "pine nuts"],
         "instructions": ["make pesto", "boil gnocchi", "mix"],
         "imageUrl": "https://via.placeholder.com/400x300/3f3f46/ffffff?text=Recipe+Image"}
    ]"#;

    struct CannedProvider(String);

    #[async_trait]
    impl ChatCompletion for CannedProvider {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ChatCompletion for FailingProvider {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("Groq API request failed: Status 500"))
        }
    }

    struct StockImages;

    #[async_trait]
    impl ImageSearch for StockImages {
        async fn image_for(&self, title: &str) -> String {
            format!("https://img.test/{}", crate::recipes::model::slugify(title))
        }
    }

    struct OfflineImages;

    #[async_trait]
    impl ImageSearch for OfflineImages {
        async fn image_for(&self, title: &str) -> String {
            placeholder_url(title)
        }
    }

    #[test]
    fn extracts_array_from_fenced_prose() {
        let content = "Sure! ```json\n[{\"id\": \"x\"}]\n```";
        assert_eq!(extract_json_array(content), Some("[{\"id\": \"x\"}]"));
    }

    #[test]
    fn extracts_bare_array_unchanged() {
        assert_eq!(extract_json_array("[1, 2]"), Some("[1, 2]"));
    }

    #[test]
    fn rejects_content_without_an_array() {
        assert_eq!(extract_json_array("Sorry, I can't help with that."), None);
        assert_eq!(extract_json_array("] backwards ["), None);
    }

    #[tokio::test]
    async fn fenced_and_bare_content_parse_identically() {
        let fenced = format!("Sure! Here you go: ```json\n{}\n```", THREE_RECIPES);
        let bare_gen = RecipeGenerator::new(Some(CannedProvider(THREE_RECIPES.to_string())), StockImages);
        let fenced_gen = RecipeGenerator::new(Some(CannedProvider(fenced)), StockImages);

        let bare = bare_gen.generate("pasta").await.unwrap();
        let wrapped = fenced_gen.generate("pasta").await.unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare.len(), 3);
    }

    #[tokio::test]
    async fn enriches_in_model_order() {
        let generator = RecipeGenerator::new(Some(CannedProvider(THREE_RECIPES.to_string())), StockImages);
        let recipes = generator.generate("pasta").await.unwrap();

        let titles: Vec<_> = recipes.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Spaghetti Carbonara", "Pasta Primavera", "Pesto Gnocchi"]);
        assert_eq!(
            recipes[0].image_url.as_deref(),
            Some("https://img.test/spaghetti-carbonara")
        );
        assert!(recipes.iter().all(|r| r.image_url.is_some()));
    }

    #[tokio::test]
    async fn upstream_failure_collapses_to_empty() {
        let generator = RecipeGenerator::new(Some(FailingProvider), StockImages);
        assert!(generator.generate("pasta").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn arrayless_content_collapses_to_empty() {
        let generator = RecipeGenerator::new(
            Some(CannedProvider("I only do haiku.".to_string())),
            StockImages,
        );
        assert!(generator.generate("pasta").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_collapses_to_empty() {
        let generator = RecipeGenerator::new(
            Some(CannedProvider("[{title: unquoted}]".to_string())),
            StockImages,
        );
        assert!(generator.generate("pasta").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_key_fails_fast() {
        let generator: RecipeGenerator<CannedProvider, StockImages> =
            RecipeGenerator::new(None, StockImages);
        assert!(matches!(
            generator.generate("pasta").await,
            Err(GenerationError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn image_outage_still_returns_recipes() {
        let generator = RecipeGenerator::new(Some(CannedProvider(THREE_RECIPES.to_string())), OfflineImages);
        let recipes = generator.generate("pasta").await.unwrap();
        assert_eq!(recipes.len(), 3);
        assert_eq!(
            recipes[0].image_url.as_deref(),
            Some(placeholder_url("Spaghetti Carbonara").as_str())
        );
    }

    #[tokio::test]
    async fn short_counts_pass_through() {
        let two = r#"[
            {"id": "a", "title": "A", "prepTime": "5 min", "ingredients": [], "instructions": [], "imageUrl": ""},
            {"id": "b", "title": "B", "prepTime": "5 min", "ingredients": [], "instructions": [], "imageUrl": ""}
        ]"#;
        let generator = RecipeGenerator::new(Some(CannedProvider(two.to_string())), StockImages);
        assert_eq!(generator.generate("anything").await.unwrap().len(), 2);
    }
}
