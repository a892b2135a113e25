//! OpenAI adapter (chat completions).
//!
//! Implements [`GenerationPort`] on top of `POST {base}/chat/completions`.

use std::time::Duration;

use async_trait::async_trait;
use cmb_core::{
    errors::Error,
    model::{GenerationError, GenerationPort, GenerationRequest},
    Result,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// `timeout` bounds each HTTP request; callers may still enforce a shorter one.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("openai http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatRequest<'a> {
    fn from_request(req: &'a GenerationRequest) -> Self {
        Self {
            model: &req.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &req.system,
                },
                ChatMessage {
                    role: "user",
                    content: &req.user,
                },
            ],
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the first choice's text from a chat-completions body.
fn parse_completion(body: &str) -> std::result::Result<String, GenerationError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidResponse(format!("openai json error: {e}")))?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(text.to_string())
}

/// Map a non-success HTTP status to a generation error.
fn classify_status(status: u16, body: &str) -> GenerationError {
    if status == 429 {
        return GenerationError::RateLimited;
    }
    let excerpt: String = body.chars().take(200).collect();
    GenerationError::Server(format!("openai returned HTTP {status}: {excerpt}"))
}

fn classify_transport(e: &reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Transport(format!("openai request error: {e}"))
    }
}

#[async_trait]
impl GenerationPort for OpenAiClient {
    fn provider(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        req: GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        let body = ChatRequest::from_request(&req);
        debug!(model = %req.model, max_tokens = req.max_tokens, "openai chat completion");

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| classify_transport(&e))?;
        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &text));
        }
        parse_completion(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_has_system_then_user() {
        let req = GenerationRequest {
            model: "gpt-4o".to_string(),
            system: "persona".to_string(),
            user: "question".to_string(),
            max_tokens: 160,
            temperature: 0.5,
        };
        let body = serde_json::to_value(ChatRequest::from_request(&req)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "question"}
                ],
                "max_tokens": 160,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn parses_first_choice_trimmed() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  gm ser \n"}},
                {"index": 1, "message": {"role": "assistant", "content": "other"}}
            ]
        })
        .to_string();
        assert_eq!(parse_completion(&body).unwrap(), "gm ser");
    }

    #[test]
    fn empty_or_missing_content_is_empty() {
        let blank = json!({"choices": [{"message": {"content": "   "}}]}).to_string();
        assert_eq!(parse_completion(&blank), Err(GenerationError::Empty));

        let null = json!({"choices": [{"message": {"content": null}}]}).to_string();
        assert_eq!(parse_completion(&null), Err(GenerationError::Empty));

        let none = json!({"choices": []}).to_string();
        assert_eq!(parse_completion(&none), Err(GenerationError::Empty));
    }

    #[test]
    fn malformed_json_is_invalid_response() {
        assert!(matches!(
            parse_completion("<html>bad gateway</html>"),
            Err(GenerationError::InvalidResponse(_))
        ));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(classify_status(429, "slow down"), GenerationError::RateLimited);
        assert!(matches!(classify_status(503, "down"), GenerationError::Server(m) if m.contains("503")));

        let long = "x".repeat(1_000);
        let GenerationError::Server(msg) = classify_status(400, &long) else {
            panic!("expected server error");
        };
        assert!(msg.len() < 300);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = OpenAiClient::new("k", "https://api.openai.com/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(c.endpoint(), "https://api.openai.com/v1/chat/completions");
    }
}
