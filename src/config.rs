use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_api_key: Option<String>,
    pub unsplash_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub temperature: f32,
    pub favorites_path: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        // Missing GROQ_API_KEY is not fatal here; searches fail fast at the
        // call site instead so the favorites screens still work without it.
        let groq_api_key = env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty());
        let unsplash_key = env::var("UNSPLASH_KEY").ok().filter(|k| !k.is_empty());

        let model = env::var("GROQ_MODEL")
            .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string());

        let api_url = env::var("GROQ_API_URL")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1/chat/completions".to_string());

        let temperature = env::var("GROQ_TEMPERATURE")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0.7);

        let favorites_path = env::var("FAVORITES_PATH")
            .unwrap_or_else(|_| "data/favorites.json".to_string());

        Self {
            groq_api_key,
            unsplash_key,
            model,
            api_url,
            temperature,
            favorites_path,
        }
    }
}
