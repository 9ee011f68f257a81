use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::types::{ApiError, MessagesRequest, MessagesResponse, RequestMessage};
use crate::domain::ChatMessage;
use crate::error::CollaboratorError;
use crate::ports::ChatCompletion;

/// Default request timeout in seconds. Completions can be slow.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Version header required by the Messages API.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const MESSAGES_ENDPOINT: &str = "v1/messages";

/// Default CLI version (from Cargo.toml)
const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

fn build_user_agent() -> String {
    format!("livepad/{}", DEFAULT_VERSION)
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(build_user_agent())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
        })
    }

    fn build_url(base_url: &str, endpoint: &str) -> Result<Url> {
        let base =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
        base.join(endpoint)
            .with_context(|| format!("Failed to build URL for endpoint: {}", endpoint))
    }

    fn request_body<'a>(
        &'a self,
        system_prompt: &'a str,
        messages: &'a [ChatMessage],
    ) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: system_prompt,
            messages: messages
                .iter()
                .map(|m| RequestMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        }
    }

    /// Send one Messages request and return the text of the reply.
    ///
    /// Single attempt: failures are surfaced, never retried.
    pub async fn send_messages(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ApiError> {
        let url = Self::build_url(&self.base_url, MESSAGES_ENDPOINT)
            .map_err(|e| ApiError::Transport(format!("{:#}", e)))?;
        let body = self.request_body(system_prompt, messages);

        debug!("=== API Request ===");
        debug!("URL: {}", url);
        debug!("Model: {}, messages: {}", self.model, messages.len());

        let response = self
            .client
            .post(url.clone())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ApiError::Transport(format!("Failed to send request to {}: {}", url, e))
            })?;

        let status = response.status();
        debug!("=== API Response ===");
        debug!("Status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let api_error = ApiError::from_status(status, error_text);
            error!("API request failed: {}", api_error);
            return Err(api_error);
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to parse API response: {}", e)))?;
        debug!(
            "Usage: {} input / {} output tokens",
            parsed.usage.input_tokens, parsed.usage.output_tokens
        );
        parsed
            .text()
            .ok_or_else(|| ApiError::Transport("API response contained no text".to_string()))
    }
}

impl ChatCompletion for AnthropicClient {
    fn complete<'a>(
        &'a self,
        system_prompt: &'a str,
        messages: &'a [ChatMessage],
    ) -> BoxFuture<'a, Result<String, CollaboratorError>> {
        async move {
            self.send_messages(system_prompt, messages)
                .await
                .map_err(|e| CollaboratorError::Completion(e.to_string()))
        }
        .boxed()
    }
}

impl ApiError {
    /// Map a non-success HTTP status to a user-facing error.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::InvalidApiKey,
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
            _ => ApiError::Http {
                status: status.as_u16(),
                body,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let url =
            AnthropicClient::build_url("https://api.anthropic.com/", MESSAGES_ENDPOINT).unwrap();
        assert_eq!(url.as_str(), "https://api.anthropic.com/v1/messages");

        let url =
            AnthropicClient::build_url("https://api.anthropic.com", MESSAGES_ENDPOINT).unwrap();
        assert_eq!(url.as_str(), "https://api.anthropic.com/v1/messages");

        assert!(AnthropicClient::build_url("not a url", MESSAGES_ENDPOINT).is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, String::new()).to_string(),
            "Invalid API key: Please check your Anthropic API key configuration"
        );
        assert_eq!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()).to_string(),
            "Rate limit exceeded: Too many requests. Please try again later."
        );
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream".to_string()).to_string(),
            "API error (HTTP 502): upstream"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let client = AnthropicClient::new(
            "https://api.anthropic.com/",
            "key",
            "claude-3-sonnet-20240229",
            4096,
        )
        .unwrap();
        let messages = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let body = serde_json::to_value(client.request_body("SYSTEM", &messages)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "claude-3-sonnet-20240229",
                "max_tokens": 4096,
                "system": "SYSTEM",
                "messages": [
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": "hello" }
                ]
            })
        );
    }
}
