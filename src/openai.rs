/*
minimal OpenAI-compatible chat completion client, single turn, no streaming
*/

use futures_util::future::BoxFuture;
use secrecy::ExposeSecret;

use crate::common::{ApiKey, ChatConfig, ChatError, MsgRole, mask_key_secure};

/// Something that can answer one prompt. The controller only talks to this,
/// so tests can swap in a stub.
pub trait ChatBackend: Send + Sync {
    fn model(&self) -> &str;
    fn complete(&self, prompt: String) -> BoxFuture<'static, Result<String, ChatError>>;
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ChatMessage {
    pub role: MsgRole,
    pub content: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatCompletionRequest {
    /// Builds a request from the optional system prompt and the one
    /// current user message. Nothing from earlier turns is included.
    pub fn single_turn(model: &str, system_prompt: Option<&str>,
            prompt: String) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt.filter(|s| !s.trim().is_empty()) {
            messages.push(ChatMessage {
                role: MsgRole::System,
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage { role: MsgRole::User, content: prompt });
        Self { model: model.to_string(), messages }
    }
}

#[derive(Debug, serde::Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, serde::Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, serde::Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

// {"error": {"message": "...", ...}}
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: ApiKey,
    endpoint: String,
    model: String,
    system_prompt: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: ApiKey, config: &ChatConfig) -> Self {
        log::info!("using key: {}", mask_key_secure(api_key.key.expose_secret()));
        Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint: format!("{}/chat/completions",
                config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
        }
    }

    pub async fn send(&self, prompt: String) -> Result<String, ChatError> {
        let request = ChatCompletionRequest::single_turn(
            &self.model, self.system_prompt.as_deref(), prompt);

        let response = self.http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // surface the service's own message when it sends one
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(api_err) => api_err.error.message,
                Err(_) if body.trim().is_empty() => status.to_string(),
                Err(_) => format!("{}: {}", status, body.trim()),
            };
            log::warn!("chat completion failed with {}: {}", status, message);
            return Err(ChatError::RequestFailed(message));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::RequestFailed(
                format!("could not parse reply: {}", e)))?;

        parsed.choices.into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ChatError::RequestFailed("empty reply".to_string()))
    }
}

impl ChatBackend for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: String) -> BoxFuture<'static, Result<String, ChatError>> {
        let client = self.clone();
        Box::pin(async move { client.send(prompt).await })
    }
}
