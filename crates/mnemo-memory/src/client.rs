// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for OpenAI-compatible chat completions.

use std::time::Duration;

use async_trait::async_trait;
use mnemo_core::traits::{CompletionClient, CompletionRequest};
use mnemo_core::types::ProviderEndpoint;
use mnemo_core::MnemoError;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: String,
}

/// Reqwest-backed [`CompletionClient`] with strict structured output and
/// a per-request timeout.
pub struct HttpCompletionClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpCompletionClient {
    pub fn new(timeout: Duration) -> Result<Self, MnemoError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| MnemoError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { http, timeout })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete_structured(
        &self,
        endpoint: &ProviderEndpoint,
        request: CompletionRequest,
    ) -> Result<String, MnemoError> {
        let url = format!(
            "{}/chat/completions",
            endpoint.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": false,
            "temperature": request.temperature,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.schema,
                },
            },
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&endpoint.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MnemoError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    MnemoError::Provider {
                        message: format!("request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| MnemoError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            warn!(%status, model = %request.model, "extraction API error");
            return Err(MnemoError::Provider {
                message: format!("API error (status {}): {text}", status.as_u16()),
                source: None,
            });
        }

        let parsed: ApiResponse =
            serde_json::from_str(&text).map_err(|e| MnemoError::Provider {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MnemoError::Provider {
                message: "no response from extractor model".to_string(),
                source: None,
            })?;

        Ok(choice.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_core::types::ChatMessage;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "small-1".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "extract".to_string(),
            }],
            temperature: 0.3,
            schema_name: "memory_extraction".to_string(),
            schema: serde_json::json!({"type": "object"}),
        }
    }

    fn endpoint(base_url: &str) -> ProviderEndpoint {
        ProviderEndpoint {
            base_url: base_url.to_string(),
            api_key: "sk-test".to_string(),
        }
    }

    #[tokio::test]
    async fn sends_structured_request_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "small-1",
                "stream": false,
                "temperature": 0.3,
                "response_format": {
                    "type": "json_schema",
                    "json_schema": { "name": "memory_extraction", "strict": true }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "content": "{\"memories\":[]}" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(Duration::from_secs(5)).unwrap();
        let content = client
            .complete_structured(&endpoint(&server.uri()), request())
            .await
            .unwrap();
        assert_eq!(content, "{\"memories\":[]}");
    }

    #[tokio::test]
    async fn non_success_status_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(Duration::from_secs(5)).unwrap();
        let err = client
            .complete_structured(&endpoint(&server.uri()), request())
            .await
            .unwrap_err();
        match err {
            MnemoError::Provider { message, .. } => {
                assert!(message.contains("429"));
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(Duration::from_secs(5)).unwrap();
        let err = client
            .complete_structured(&endpoint(&server.uri()), request())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Provider { .. }));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": []}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(Duration::from_millis(100)).unwrap();
        let err = client
            .complete_structured(&endpoint(&server.uri()), request())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Timeout { .. }));
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "content": "{}" } } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(Duration::from_secs(5)).unwrap();
        let base = format!("{}/", server.uri());
        client
            .complete_structured(&endpoint(&base), request())
            .await
            .unwrap();
    }
}
