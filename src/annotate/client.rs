//! OpenAI-compatible chat completions client.
//!
//! Posts to: {endpoint} with `{model, messages, temperature}`
//! Reads: `choices[0].message.content`

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{error_placeholder, AnnotationError, Annotator};
use crate::config::AnnotationConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

/// Client for a locally hosted chat completions server.
pub struct ChatClient {
    http: Client,
    config: AnnotationConfig,
}

impl ChatClient {
    pub fn new(config: AnnotationConfig) -> Result<Self, AnnotationError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    /// Send one prompt and return the reply text.
    pub async fn complete(&self, prompt: &str) -> Result<String, AnnotationError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        debug!(endpoint = %self.config.endpoint, chars = prompt.len(), "sending prompt");
        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnnotationError::Timeout
                } else {
                    AnnotationError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnnotationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.into_content().ok_or(AnnotationError::EmptyReply)
    }
}

#[async_trait]
impl Annotator for ChatClient {
    async fn annotate(&self, prompt: &str) -> String {
        match self.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "annotation request failed");
                error_placeholder(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::ERROR_PLACEHOLDER_PREFIX;

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "local-model",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 0.1,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "local-model");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
        assert!((value["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_response_content() {
        let json = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "It adds numbers."}, "finish_reason": "stop"}
            ]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_content().as_deref(), Some("It adds numbers."));
    }

    #[test]
    fn test_response_without_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"error": "model not loaded"}"#).unwrap();
        assert_eq!(response.into_content(), None);
    }

    #[tokio::test]
    async fn test_unreachable_server_yields_placeholder() {
        let config = AnnotationConfig {
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            timeout_secs: Some(2),
            ..Default::default()
        };
        let client = ChatClient::new(config).unwrap();
        let text = client.annotate("Explain this").await;
        assert!(text.starts_with(ERROR_PLACEHOLDER_PREFIX), "got {text:?}");
    }
}
