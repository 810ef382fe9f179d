//! Anthropic Messages API provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Language, TranslationError, TranslationProvider};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Settings for [`AnthropicProvider`]
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// e.g. `https://api.anthropic.com`
    pub base_url: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<RequestMessage>,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Build the translation instruction.
///
/// The model must always answer in `target`, even when the input already looks
/// like `target`: language detection on short phrases is unreliable.
pub fn build_prompt(text: &str, target: Language) -> String {
    let target_name = target.display_name();
    format!(
        "Translate the following text to {target_name}.\n\
         \n\
         Rules:\n\
         - Reply with the {target_name} translation only, no explanations or quotes\n\
         - Preserve the original tone, style and formatting\n\
         - Always produce {target_name} output, whatever language the text appears to be in\n\
         \n\
         Text to translate:\n{text}"
    )
}

/// Upstream provider backed by the Anthropic Messages API
pub struct AnthropicProvider {
    http: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TranslationProvider for AnthropicProvider {
    async fn translate(
        &self,
        text: &str,
        _source: Language,
        target: Language,
    ) -> Result<String, TranslationError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![RequestMessage {
                role: "user",
                content: build_prompt(text, target),
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslationError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::Upstream(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::Upstream(e.to_string()))?;

        body.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| TranslationError::Upstream("empty completion".to_string()))
    }
}

/// Provider used when no API key is configured: every call fails, so messages
/// are relayed untranslated.
pub struct UnavailableProvider;

#[async_trait]
impl TranslationProvider for UnavailableProvider {
    async fn translate(
        &self,
        _text: &str,
        _source: Language,
        _target: Language,
    ) -> Result<String, TranslationError> {
        Err(TranslationError::Upstream(
            "no translation API key configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn create_provider(base_url: String) -> AnthropicProvider {
        AnthropicProvider::new(AnthropicConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            max_tokens: 100,
            temperature: 0.1,
            base_url,
        })
        .unwrap()
    }

    #[test]
    fn test_prompt_always_targets_language() {
        // テスト項目: プロンプトは翻訳先言語を名指しし、翻訳の省略を許さない
        // given (前提条件):
        let text = "How are you?";

        // when (操作):
        let prompt = build_prompt(text, Language::He);

        // then (期待する結果):
        assert!(prompt.contains("to Hebrew"));
        assert!(prompt.contains("Always produce Hebrew output"));
        assert!(!prompt.contains("unchanged"));
        assert!(prompt.ends_with("How are you?"));
    }

    #[tokio::test]
    async fn test_translate_returns_first_text_block() {
        // テスト項目: レスポンスの最初のテキストブロックをトリムして返す
        // given (前提条件):
        let router = Router::new().route(
            "/v1/messages",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["model"], "test-model");
                Json(serde_json::json!({
                    "content": [{"type": "text", "text": "  מה שלומך?\n"}]
                }))
            }),
        );
        let provider = create_provider(spawn_upstream(router).await);

        // when (操作):
        let result = provider
            .translate("How are you?", Language::En, Language::He)
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok("מה שלומך?".to_string()));
    }

    #[tokio::test]
    async fn test_translate_maps_error_status_to_upstream_error() {
        // テスト項目: エラーステータスは Upstream エラーになる
        // given (前提条件):
        let router = Router::new().route(
            "/v1/messages",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let provider = create_provider(spawn_upstream(router).await);

        // when (操作):
        let result = provider.translate("Hi", Language::En, Language::Fr).await;

        // then (期待する結果):
        assert!(matches!(result, Err(TranslationError::Upstream(msg)) if msg.contains("429")));
    }

    #[tokio::test]
    async fn test_unavailable_provider_always_fails() {
        // テスト項目: API キー未設定時のプロバイダは常に失敗する
        // given (前提条件):
        let provider = UnavailableProvider;

        // when (操作):
        let result = provider.translate("Hi", Language::En, Language::Fr).await;

        // then (期待する結果):
        assert!(matches!(result, Err(TranslationError::Upstream(_))));
    }
}
