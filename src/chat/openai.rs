use super::ChatProvider;
use crate::config::ChatConfig;
use crate::error::ChatError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiChat {
    /// Build a client from configuration, reading the API key from the
    /// environment variable named in `config.api_key_env`
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ChatError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &ChatConfig, api_key: String) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            endpoint: completions_url(&config.api_base),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }
}

fn completions_url(api_base: &str) -> String {
    format!("{}/chat/completions", api_base.trim_end_matches('/'))
}

fn parse_response(response: ChatCompletionResponse) -> Result<String, ChatError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ChatError::InvalidResponse("response contained no message".to_string()))
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, ChatError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_message,
                },
            ],
        };

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match response {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let parsed: ChatCompletionResponse = response
                            .json()
                            .await
                            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
                        return parse_response(parsed);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = ChatError::Status {
                        status: status.as_u16(),
                        body: body_text,
                    };

                    // Rate limited or server error: retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!("Chat request attempt {} failed: {}", attempt + 1, err);
                        last_err = Some(err);
                        continue;
                    }

                    return Err(err);
                }
                Err(e) => {
                    tracing::warn!("Chat request attempt {} failed: {}", attempt + 1, e);
                    last_err = Some(ChatError::RequestFailed(e.to_string()));
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| ChatError::RequestFailed("chat failed after retries".to_string())))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
