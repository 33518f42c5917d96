use crate::config::OpenAiConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Produces a battle image for a prompt and returns its URL
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, round_id: i64) -> AppResult<String>;
}

/// Seeded picsum.photos image, used when no OpenAI key is configured
#[derive(Debug, Default, Clone)]
pub struct PlaceholderImageGenerator;

impl PlaceholderImageGenerator {
    pub fn url_for(round_id: i64, seed: u32) -> String {
        format!("https://picsum.photos/seed/{}_{}/600/338", round_id, seed)
    }
}

#[async_trait]
impl ImageGenerator for PlaceholderImageGenerator {
    async fn generate(&self, prompt: &str, round_id: i64) -> AppResult<String> {
        let seed = rand::thread_rng().gen_range(1..=1000);
        let url = Self::url_for(round_id, seed);
        debug!(round_id, prompt, url = %url, "placeholder battle image");
        Ok(url)
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Client for the OpenAI images API
pub struct OpenAiImageGenerator {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiImageGenerator {
    pub fn new(api_key: impl Into<String>, config: &OpenAiConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.image_model.clone(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str, round_id: i64) -> AppResult<String> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let request = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: "1792x1024",
        };

        info!(round_id, model = %self.model, "requesting battle image");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Image request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(round_id, %status, "image API error: {}", body);
            return Err(AppError::ExternalService(format!(
                "Image API error: {} - {}",
                status, body
            )));
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse image response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| AppError::ExternalService("Image API returned no URL".to_string()))
    }
}

/// Pick the generator for the configured credentials
pub fn image_generator_from_config(config: &OpenAiConfig) -> AppResult<std::sync::Arc<dyn ImageGenerator>> {
    match &config.api_key {
        Some(key) => Ok(std::sync::Arc::new(OpenAiImageGenerator::new(key.clone(), config)?)),
        None => {
            warn!("OPENAI_API_KEY not set, battle images will use placeholders");
            Ok(std::sync::Arc::new(PlaceholderImageGenerator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_url_shape() {
        let url = PlaceholderImageGenerator.generate("a vs b", 42).await.unwrap();
        assert!(url.starts_with("https://picsum.photos/seed/42_"));
        assert!(url.ends_with("/600/338"));
    }

    #[test]
    fn test_generator_selection() {
        let config = OpenAiConfig::default();
        assert!(image_generator_from_config(&config).is_ok());
    }
}
