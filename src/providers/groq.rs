use async_trait::async_trait;
use anyhow::{Result, anyhow};
use crate::providers::traits::ChatCompletion;
use reqwest::Client;
use serde_json::{json, Value};

/// Client for Groq's OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct GroqProvider {
    api_key: String,
    system_message: String,
    client: Client,
    model: String,
    api_url: String,
    temperature: f32,
}

impl GroqProvider {
    pub fn new(
        api_key: String,
        system_message: String,
        model: String,
        api_url: String,
        temperature: f32,
    ) -> Self {
        Self {
            api_key,
            system_message,
            client: Client::new(),
            model,
            api_url,
            temperature,
        }
    }
}

#[async_trait]
impl ChatCompletion for GroqProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self.client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": self.system_message
                    },
                    {
                        "role": "user",
                        "content": prompt
                    }
                ],
                "temperature": self.temperature
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Groq API request failed: Status {}, Body: {}", status, error_text));
        }

        let response_json: Value = response.json().await?;

        if let Some(error) = response_json.get("error") {
            return Err(anyhow!("Groq API returned error: {}", error));
        }

        response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("No content in Groq response"))
    }
}
