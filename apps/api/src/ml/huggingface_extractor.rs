use crate::{
    config::HuggingFaceConfig,
    error::{ApiError, Result},
    ml::{feature_extractor::FeatureExtractor, similarity::Embedding},
};
use async_trait::async_trait;
use log::info;
use lru::LruCache;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde_json::Value;
use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::{debug, error, warn};

const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Outcome of a single request round trip
enum AttemptError {
    /// Worth retrying: timeouts, 5xx, rate limits
    Transient(ApiError),
    /// Retrying will not help: bad credentials, missing model, unusable image
    Permanent(ApiError),
}

/// Image feature extractor backed by the Hugging Face inference API.
///
/// Downloads the image, posts its bytes to a vision transformer
/// (`google/vit-base-patch16-224` by default) and keeps the first (CLS)
/// token of the returned hidden states as the embedding.
#[derive(Clone)]
pub struct HuggingFaceImageExtractor {
    client: Client,
    api_key: String,
    model_url: String,
    model_name: String,
    retry_attempts: u32,
    retry_delay_ms: u64,
    cache: Arc<Mutex<LruCache<String, Embedding>>>,
}

impl HuggingFaceImageExtractor {
    pub fn new(config: &HuggingFaceConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ApiError::ConfigError(
                "Hugging Face API key is empty".to_string(),
            ));
        }

        info!(
            "Initializing Hugging Face extractor with model: {}, timeout: {}s, connection timeout: {}s",
            config.model_name, config.timeout_seconds, config.connect_timeout_seconds
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        let cache_size = NonZeroUsize::new(config.cache_size.max(1))
            .ok_or_else(|| ApiError::ConfigError("cache_size must be positive".to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model_url: format!(
                "{}/models/{}",
                config.base_url.trim_end_matches('/'),
                config.model_name
            ),
            model_name: config.model_name.clone(),
            retry_attempts: config.retry_attempts.max(1),
            retry_delay_ms: config.retry_delay_ms,
            cache: Arc::new(Mutex::new(LruCache::new(cache_size))),
        })
    }

    /// Delay before retry number `attempt`, doubling from `retry_delay_ms`.
    fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        2u64.checked_pow(attempt.saturating_sub(1))
            .map_or(u64::MAX, |factor| self.retry_delay_ms.saturating_mul(factor))
    }

    fn cached(&self, image_url: &str) -> Option<Embedding> {
        self.cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(image_url).cloned())
    }

    fn remember(&self, image_url: &str, embedding: &Embedding) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(image_url.to_string(), embedding.clone());
        }
    }

    async fn download_image(
        &self,
        image_url: &str,
    ) -> std::result::Result<(Vec<u8>, String), AttemptError> {
        let response = self.client.get(image_url).send().await.map_err(|e| {
            AttemptError::Transient(ApiError::ExtractionFailed(format!(
                "Failed to download image {}: {}",
                image_url, e
            )))
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = ApiError::ExtractionFailed(format!(
                "Image download returned {} for {}",
                status, image_url
            ));
            return Err(if status.is_server_error() {
                AttemptError::Transient(err)
            } else {
                AttemptError::Permanent(err)
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or(DEFAULT_IMAGE_CONTENT_TYPE)
            .to_string();

        let bytes = response.bytes().await.map_err(|e| {
            AttemptError::Transient(ApiError::ExtractionFailed(format!(
                "Failed to read image body {}: {}",
                image_url, e
            )))
        })?;

        if bytes.is_empty() {
            return Err(AttemptError::Permanent(ApiError::ExtractionFailed(format!(
                "Image {} is empty",
                image_url
            ))));
        }

        Ok((bytes.to_vec(), content_type))
    }

    async fn request_embedding(
        &self,
        image_url: &str,
    ) -> std::result::Result<Embedding, AttemptError> {
        let (bytes, content_type) = self.download_image(image_url).await?;

        let response = self
            .client
            .post(&self.model_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, content_type)
            .header("x-wait-for-model", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                AttemptError::Transient(ApiError::ExtractionFailed(format!(
                    "Failed to send request to model API: {}",
                    e
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.classify_failure(status, text));
        }

        let body: Value = response.json().await.map_err(|e| {
            AttemptError::Permanent(ApiError::ExtractionFailed(format!(
                "Failed to parse response as JSON: {}",
                e
            )))
        })?;

        parse_embedding(&body).map_err(AttemptError::Permanent)
    }

    fn classify_failure(&self, status: StatusCode, text: String) -> AttemptError {
        match status {
            StatusCode::NOT_FOUND => AttemptError::Permanent(ApiError::ExtractionFailed(format!(
                "Model not found: {}. Please check the model name in your configuration.",
                self.model_name
            ))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AttemptError::Permanent(ApiError::ExtractionFailed(
                    "Authentication failed. Please check your Hugging Face API key.".to_string(),
                ))
            }
            StatusCode::TOO_MANY_REQUESTS => AttemptError::Transient(ApiError::ExtractionFailed(
                "Rate limit exceeded by the Hugging Face API".to_string(),
            )),
            s if s.is_server_error() => AttemptError::Transient(ApiError::ExtractionFailed(
                format!("Hugging Face API returned {} - {}", s, text),
            )),
            s => AttemptError::Permanent(ApiError::ExtractionFailed(format!(
                "Hugging Face API returned non-success status: {} - {}",
                s, text
            ))),
        }
    }
}

impl From<AttemptError> for ApiError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::Transient(e) | AttemptError::Permanent(e) => e,
        }
    }
}

#[async_trait]
impl FeatureExtractor for HuggingFaceImageExtractor {
    async fn extract(&self, image_url: &str) -> Result<Embedding> {
        if let Some(embedding) = self.cached(image_url) {
            debug!("Cache hit for image embedding: {}", image_url);
            return Ok(embedding);
        }

        for attempt in 1..=self.retry_attempts {
            match self.request_embedding(image_url).await {
                Ok(embedding) => {
                    debug!(
                        "Got embedding of size {} for {}",
                        embedding.len(),
                        image_url
                    );
                    self.remember(image_url, &embedding);
                    return Ok(embedding);
                }
                Err(AttemptError::Permanent(e)) => return Err(e),
                Err(AttemptError::Transient(e)) if attempt < self.retry_attempts => {
                    let delay_ms = self.backoff_delay_ms(attempt);
                    warn!(
                        "Embedding request failed (attempt {}/{}): {}. Retrying in {}ms",
                        attempt, self.retry_attempts, e, delay_ms
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(AttemptError::Transient(e)) => {
                    error!(
                        "All {} embedding attempts failed for {}: {}",
                        self.retry_attempts, image_url, e
                    );
                    return Err(e);
                }
            }
        }

        Err(ApiError::ExtractionFailed(format!(
            "All retry attempts failed for {}",
            image_url
        )))
    }

    /// Asks the inference API to load the model and waits until it is up.
    ///
    /// The empty payload is rejected once the model is loaded; a 400 or 422
    /// still means the model answered.
    async fn prewarm(&self) -> Result<bool> {
        info!("Warming up Hugging Face model: {}", self.model_name);

        let response = self
            .client
            .post(&self.model_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("x-wait-for-model", "true")
            .json(&serde_json::json!({ "inputs": "" }))
            .send()
            .await
            .map_err(|e| ApiError::ExternalServiceError(format!("Model warm-up failed: {}", e)))?;

        let status = response.status();
        if status.is_success()
            || status == StatusCode::BAD_REQUEST
            || status == StatusCode::UNPROCESSABLE_ENTITY
        {
            debug!("Model {} answered warm-up with {}", self.model_name, status);
            return Ok(true);
        }

        let text = response.text().await.unwrap_or_default();
        Err(self.classify_failure(status, text).into())
    }
}

/// Pull a single embedding out of a feature-extraction response.
///
/// Handles a flat vector, `[[...]]` batches, `[[[...]]]` hidden states (first
/// sequence, first token) and `{"embedding": [...]}` objects.
fn parse_embedding(body: &Value) -> Result<Embedding> {
    let mut current = body;

    loop {
        match current {
            Value::Array(items) => match items.first() {
                None => {
                    return Err(ApiError::ExtractionFailed(
                        "Received empty array from model".to_string(),
                    ))
                }
                Some(first) if first.is_array() => current = first,
                Some(_) => {
                    return items
                        .iter()
                        .map(|v| v.as_f64().map(|f| f as f32))
                        .collect::<Option<Embedding>>()
                        .ok_or_else(|| {
                            ApiError::ExtractionFailed(
                                "Embedding contains non-numeric values".to_string(),
                            )
                        })
                }
            },
            Value::Object(map) => {
                if let Some(inner) = map.get("embedding").or_else(|| map.get("embeddings")) {
                    current = inner;
                } else if let Some(message) = map.get("error") {
                    return Err(ApiError::ExtractionFailed(format!(
                        "Model API error: {}",
                        message
                    )));
                } else {
                    return Err(ApiError::ExtractionFailed(
                        "Failed to extract embedding from response".to_string(),
                    ));
                }
            }
            _ => {
                return Err(ApiError::ExtractionFailed(
                    "Unexpected response shape from model".to_string(),
                ))
            }
        }
    }
}
