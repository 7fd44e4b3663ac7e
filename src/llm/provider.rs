use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::InterpretError;

/// A chat model that answers a single prompt with a JSON object.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send `prompt` as one user message and return the raw reply text.
    async fn complete_json(&self, prompt: &str) -> Result<String, InterpretError>;
}

/// `ChatProvider` backed by an HTTP chat API.
///
/// Reads the live `LlmConfig` on every call so runtime config updates apply
/// to the next request.
pub struct HttpChatProvider {
    client: reqwest::Client,
    config: Arc<RwLock<LlmConfig>>,
}

impl HttpChatProvider {
    pub fn new(client: reqwest::Client, config: Arc<RwLock<LlmConfig>>) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    async fn complete_json(&self, prompt: &str) -> Result<String, InterpretError> {
        let config = self.config.read().clone();
        match config.provider.as_str() {
            "mistral" | "openai" => call_openai(&self.client, &config, prompt).await,
            "ollama" => call_ollama(&self.client, &config, prompt).await,
            other => Err(InterpretError::Unavailable(format!(
                "unknown LLM provider: {other}"
            ))),
        }
    }
}

async fn post_json<T: Serialize>(
    request: reqwest::RequestBuilder,
    body: &T,
) -> Result<String, InterpretError> {
    let resp = request
        .json(body)
        .send()
        .await
        .map_err(|e| InterpretError::Unavailable(e.to_string()))?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| InterpretError::Unavailable(e.to_string()))?;

    if !status.is_success() {
        return Err(InterpretError::Unavailable(format!(
            "chat API returned {status}: {text}"
        )));
    }
    Ok(text)
}

// ─── OpenAI-compatible (Mistral, OpenAI) ─────────────────

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

async fn call_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
) -> Result<String, InterpretError> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: &config.chat_model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        response_format: ResponseFormat {
            kind: "json_object",
        },
    };

    let body = post_json(
        client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}")),
        &req,
    )
    .await?;

    openai_reply_content(&body)
}

fn openai_reply_content(body: &str) -> Result<String, InterpretError> {
    let parsed: OpenAiChatResponse =
        serde_json::from_str(body).map_err(|e| InterpretError::Malformed(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(InterpretError::Empty)
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    format: &'static str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaResponseMessage>,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

async fn call_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
) -> Result<String, InterpretError> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaChatRequest {
        model: &config.chat_model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        format: "json",
        stream: false,
    };

    let body = post_json(client.post(&url), &req).await?;
    ollama_reply_content(&body)
}

fn ollama_reply_content(body: &str) -> Result<String, InterpretError> {
    let parsed: OllamaChatResponse =
        serde_json::from_str(body).map_err(|e| InterpretError::Malformed(e.to_string()))?;

    parsed
        .message
        .map(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(InterpretError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_request_asks_for_json_object() {
        let req = OpenAiChatRequest {
            model: "mistral-medium",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "mistral-medium");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_openai_reply_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"курс\": 3}"}}]}"#;
        assert_eq!(openai_reply_content(body).unwrap(), r#"{"курс": 3}"#);
    }

    #[test]
    fn test_openai_reply_without_choices_is_empty() {
        let err = openai_reply_content(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, InterpretError::Empty));

        let err = openai_reply_content(r#"{"id": "x"}"#).unwrap_err();
        assert!(matches!(err, InterpretError::Empty));
    }

    #[test]
    fn test_openai_reply_null_content_is_empty() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert!(matches!(
            openai_reply_content(body).unwrap_err(),
            InterpretError::Empty
        ));
    }

    #[test]
    fn test_openai_reply_not_json_is_malformed() {
        let err = openai_reply_content("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, InterpretError::Malformed(_)));
    }

    #[test]
    fn test_ollama_reply_content() {
        let body = r#"{"model":"llama3.2","message":{"role":"assistant","content":"{}"},"done":true}"#;
        assert_eq!(ollama_reply_content(body).unwrap(), "{}");
        assert!(matches!(
            ollama_reply_content(r#"{"done":true}"#).unwrap_err(),
            InterpretError::Empty
        ));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_unavailable() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..LlmConfig::default()
        };
        let provider =
            HttpChatProvider::new(reqwest::Client::new(), Arc::new(RwLock::new(config)));
        let err = provider.complete_json("prompt").await.unwrap_err();
        assert!(matches!(err, InterpretError::Unavailable(_)));
    }
}
