use crate::config::GenerationConfig;
use crate::error::{PropevalError, Result};
use crate::generate::secrets::SecretProvider;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Anything that turns a prompt into text.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Request structure for the generateContent API
#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Response structure from the generateContent API
#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// A failed attempt and whether it is worth retrying.
struct AttemptError {
    error: PropevalError,
    retryable: bool,
}

/// Gemini generative text client
///
/// Built from an explicit [`GenerationConfig`]; the API key comes from a
/// [`SecretProvider`] and is sent as a request header.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    max_retries: usize,
}

impl GeminiClient {
    /// Create a client, resolving the API key through `secrets`.
    /// Fails with [`PropevalError::Config`] if `config` does not validate.
    pub fn from_config(config: &GenerationConfig, secrets: &dyn SecretProvider) -> Result<Self> {
        config.validate()?;
        let api_key = secrets.secret(&config.api_key_env)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PropevalError::Generation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    /// Single API request, classified for retry.
    async fn generate_once(&self, prompt: &str) -> std::result::Result<String, AttemptError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AttemptError {
                retryable: e.is_timeout() || e.is_connect(),
                error: PropevalError::Generation(format!("Network error: {}", e)),
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(AttemptError {
                retryable: is_retryable_status(status),
                error: PropevalError::Generation(format!("Gemini API error {}: {}", status, body)),
            });
        }

        let result: GenerateResponse = response.json().await.map_err(|e| AttemptError {
            retryable: false,
            error: PropevalError::Generation(format!("Failed to parse response: {}", e)),
        })?;

        extract_text(result).map_err(|error| AttemptError {
            retryable: false,
            error,
        })
    }
}

impl TextGenerator for GeminiClient {
    /// Generate text with exponential backoff on rate limits and server errors.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.generate_once(prompt).await {
                Ok(text) => {
                    log::debug!(
                        "Generation API call took {:?} (attempt {})",
                        start.elapsed(),
                        attempt + 1
                    );
                    return Ok(text);
                }
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    log::warn!(
                        "Retry {}/{} after error: {}",
                        attempt + 1,
                        self.max_retries,
                        failure.error
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Concatenated text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        return Err(PropevalError::Generation(
            "Empty response from Gemini API".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::secrets::StaticSecretProvider;

    fn config() -> GenerationConfig {
        GenerationConfig {
            api_base: "https://example.test/v1beta/".to_string(),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn test_client_from_config() {
        let secrets = StaticSecretProvider::new().with("GEMINI_API_KEY", "test-key");
        let client = GeminiClient::from_config(&config(), &secrets).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.max_retries, 3);
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash-lite:generateContent"
        );
    }

    #[test]
    fn test_client_missing_secret() {
        let secrets = StaticSecretProvider::new();
        let err = GeminiClient::from_config(&config(), &secrets).err().unwrap();
        assert!(matches!(err, PropevalError::Secret(_)));
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let secrets = StaticSecretProvider::new().with("GEMINI_API_KEY", "test-key");
        let config = GenerationConfig {
            provider: "openai".to_string(),
            ..config()
        };
        let err = GeminiClient::from_config(&config, &secrets).err().unwrap();
        assert!(matches!(err, PropevalError::Config(_)));
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "Describe 1 Main St" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "Describe 1 Main St"}]}]})
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Bright "},{"text":"home."}],"role":"model"},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Bright home.");
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let response: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(extract_text(response).is_err());
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
    }
}
