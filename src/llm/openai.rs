//! `OpenAI` and `OpenAI`-compatible chat completions

use super::prompt::build_system_prompt;
use super::types::{IntentReply, IntentRequest, Usage};
use super::{IntentService, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible intent service
pub struct OpenAiIntentService {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiIntentService {
    pub fn new(
        api_key: String,
        model: String,
        gateway: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            url: chat_url(gateway),
        })
    }

    fn translate_request(&self, request: &IntentRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(build_system_prompt(&request.todos)),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(request.message.clone()),
                },
            ],
            response_format: ResponseFormat {
                r#type: "json_object".to_string(),
            },
        }
    }

    fn normalize_response(resp: ChatResponse) -> Result<IntentReply, TransportError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::unknown("No choices in response"))?;

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(IntentReply {
            content: choice.message.content.unwrap_or_default(),
            usage,
        })
    }
}

fn chat_url(gateway: Option<&str>) -> String {
    match gateway {
        Some(gw) => format!("{}/openai/v1/chat/completions", gw.trim_end_matches('/')),
        None => OPENAI_CHAT_URL.to_string(),
    }
}

fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl IntentService for OpenAiIntentService {
    async fn request_intent(&self, request: &IntentRequest) -> Result<IntentReply, TransportError> {
        let chat_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    TransportError::network(format!("Connection failed: {e}"))
                } else {
                    TransportError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ChatErrorResponse>(&body)
                .map_or(body, |error_resp| error_resp.error.message);
            let err = TransportError::from_status(status.as_u16(), &message);
            return Err(match retry_after {
                Some(duration) => err.with_retry_after(duration),
                None => err,
            });
        }

        let chat_response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            TransportError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(chat_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Chat completions wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatErrorResponse {
    error: ChatError,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
}
