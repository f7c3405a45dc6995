//! Reqwest-based LLM client for OpenAI-compatible Chat Completions.
//!
//! The default endpoint is Gemini's OpenAI-compatible API, so a Gemini key and
//! model name work out of the box. Any other compatible server can be used by
//! setting `API_BASE_URL`.

use std::{pin::Pin, time::Duration};

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, StudyError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Every request is a single user turn carrying the full prompt.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: Option<u32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: None,
        }
    }
}

#[derive(Debug)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LlmClient {
    /// Build a client from configuration. Fails with [`StudyError::MissingApiKey`]
    /// when no key is configured.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let api_key = cfg.get_nonempty("GEMINI_API_KEY").ok_or(StudyError::MissingApiKey)?;
        let timeout = cfg.get_u64("REQUEST_TIMEOUT").unwrap_or(60);
        let base_url = normalize_base_url(&cfg.get("API_BASE_URL").unwrap_or_else(|| "default".into()));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(Self { http, base_url, api_key })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self, streaming: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if streaming {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        }
        let hv = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| StudyError::Decode(format!("invalid API key header: {}", e)))?;
        headers.insert(AUTHORIZATION, hv);
        Ok(headers)
    }

    /// Send one chat completion request and return the first choice's text.
    pub async fn chat(&self, messages: &[ChatMessage], opts: &ChatOptions) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = request_body(messages, opts, false);
        info!(model = %opts.model, "sending chat completion request");

        let resp = self
            .http
            .post(url)
            .headers(self.headers(false)?)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(StudyError::Api { status: status.as_u16(), body: text });
        }
        parse_completion(&text)
    }

    /// Stream the completion as content deltas from the server-sent events.
    pub fn chat_stream(
        &self,
        messages: Vec<ChatMessage>,
        opts: ChatOptions,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send + '_>> {
        Box::pin(try_stream! {
            let url = format!("{}/chat/completions", self.base_url);
            let body = request_body(&messages, &opts, true);
            info!(model = %opts.model, "sending streaming chat completion request");

            let resp = self
                .http
                .post(url)
                .headers(self.headers(true)?)
                .json(&body)
                .send()
                .await?;

            let resp = if resp.status().is_success() {
                resp
            } else {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                Err::<reqwest::Response, _>(StudyError::Api { status, body })?
            };

            let mut buf = String::new();
            let mut stream = resp.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let bytes = chunk?;
                buf.push_str(&String::from_utf8_lossy(&bytes));
                while let Some(pos) = buf.find('\n') {
                    let line: String = buf.drain(..=pos).collect();
                    match parse_sse_line(&line) {
                        Some(StreamEvent::Done) => {
                            yield StreamEvent::Done;
                            return;
                        }
                        Some(ev) => yield ev,
                        None => {}
                    }
                }
            }
            yield StreamEvent::Done;
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum StreamEvent {
    Content(String),
    Done,
}

fn normalize_base_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw == "default" {
        DEFAULT_BASE_URL.to_string()
    } else {
        raw.trim_end_matches('/').to_string()
    }
}

fn request_body(messages: &[ChatMessage], opts: &ChatOptions, stream: bool) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": opts.model,
        "temperature": opts.temperature,
        "top_p": opts.top_p,
        "messages": messages,
        "stream": stream,
    });
    if let Some(max) = opts.max_tokens {
        body["max_tokens"] = serde_json::json!(max);
    }
    body
}

fn parse_completion(body: &str) -> Result<String> {
    let completion: Completion =
        serde_json::from_str(body).map_err(|e| StudyError::Decode(e.to_string()))?;
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(StudyError::EmptyResponse)?;
    Ok(content)
}

/// Decode one SSE line. Comments, blank lines and malformed payloads yield `None`.
fn parse_sse_line(line: &str) -> Option<StreamEvent> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let payload = line.strip_prefix("data:")?.trim();
    if payload == "[DONE]" {
        return Some(StreamEvent::Done);
    }
    match serde_json::from_str::<Chunk>(payload) {
        Ok(chunk) => {
            let text: String = chunk
                .choices
                .into_iter()
                .filter_map(|c| c.delta.and_then(|d| d.content))
                .collect();
            (!text.is_empty()).then_some(StreamEvent::Content(text))
        }
        Err(e) => {
            debug!(error = %e, "ignoring malformed stream chunk");
            None
        }
    }
}

/// Anything that turns a prompt into generated text.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Like [`generate`](Self::generate) but hands text to `on_chunk` as it arrives.
    async fn generate_streaming(&self, prompt: &str, on_chunk: &mut dyn FnMut(&str)) -> Result<String> {
        let text = self.generate(prompt).await?;
        on_chunk(&text);
        Ok(text)
    }
}

/// The LLM capability of a session: a configured client, or disabled because
/// no credential was found.
#[derive(Debug)]
pub enum Backend {
    Remote { client: LlmClient, opts: ChatOptions },
    Disabled,
}

impl Backend {
    pub fn from_config(cfg: &Config, opts: ChatOptions) -> Result<Self> {
        match LlmClient::from_config(cfg) {
            Ok(client) => Ok(Backend::Remote { client, opts }),
            Err(StudyError::MissingApiKey) => Ok(Backend::Disabled),
            Err(e) => Err(e),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Backend::Remote { .. })
    }
}

impl TextGenerator for Backend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            Backend::Remote { client, opts } => {
                client.chat(&[ChatMessage::new(Role::User, prompt)], opts).await
            }
            Backend::Disabled => Err(StudyError::MissingApiKey),
        }
    }

    async fn generate_streaming(&self, prompt: &str, on_chunk: &mut dyn FnMut(&str)) -> Result<String> {
        let (client, opts) = match self {
            Backend::Remote { client, opts } => (client, opts),
            Backend::Disabled => return Err(StudyError::MissingApiKey),
        };
        let messages = vec![ChatMessage::new(Role::User, prompt)];
        let mut stream = client.chat_stream(messages, opts.clone());
        let mut text = String::new();
        while let Some(ev) = stream.next().await {
            match ev? {
                StreamEvent::Content(t) => {
                    on_chunk(&t);
                    text.push_str(&t);
                }
                StreamEvent::Done => break,
            }
        }
        if text.trim().is_empty() {
            return Err(StudyError::EmptyResponse);
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

// Minimal chunk structures for OpenAI-like streaming
#[derive(Debug, Deserialize)]
struct Chunk {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_to_gemini() {
        assert_eq!(normalize_base_url("default"), DEFAULT_BASE_URL);
        assert_eq!(normalize_base_url("  "), DEFAULT_BASE_URL);
        assert_eq!(normalize_base_url("http://localhost:8080/v1/"), "http://localhost:8080/v1");
    }

    #[test]
    fn request_body_omits_unset_max_tokens() {
        let messages = [ChatMessage::new(Role::User, "hi")];
        let body = request_body(&messages, &ChatOptions::default(), false);
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["stream"], false);
        assert!(body.get("max_tokens").is_none());

        let opts = ChatOptions { max_tokens: Some(2048), ..ChatOptions::default() };
        let body = request_body(&messages, &opts, true);
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn completion_returns_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"A summary."},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "A summary.");
    }

    #[test]
    fn completion_without_content_is_empty_response() {
        let body = r#"{"choices":[]}"#;
        assert!(matches!(parse_completion(body), Err(StudyError::EmptyResponse)));
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(parse_completion(body), Err(StudyError::EmptyResponse)));
    }

    #[test]
    fn completion_garbage_is_decode_error() {
        assert!(matches!(parse_completion("<html>"), Err(StudyError::Decode(_))));
    }

    #[test]
    fn sse_lines() {
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#),
            Some(StreamEvent::Content("Hel".into()))
        );
        assert_eq!(parse_sse_line("data: [DONE]\n"), Some(StreamEvent::Done));
        assert_eq!(parse_sse_line(": keep-alive"), None);
        assert_eq!(parse_sse_line(""), None);
        assert_eq!(parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#), None);
        assert_eq!(parse_sse_line("data: {not json"), None);
    }

    #[test]
    fn missing_key_disables_backend() {
        let cfg = Config::from_pairs(&[("GEMINI_API_KEY", "")]);
        if std::env::var("GEMINI_API_KEY").map(|v| v.trim().is_empty()).unwrap_or(true) {
            let backend = Backend::from_config(&cfg, ChatOptions::default()).unwrap();
            assert!(!backend.is_enabled());
        }
    }

    #[test]
    fn configured_key_enables_backend() {
        let cfg = Config::from_pairs(&[("GEMINI_API_KEY", "test-key"), ("API_BASE_URL", "http://127.0.0.1:9/")]);
        let backend = Backend::from_config(&cfg, ChatOptions::default()).unwrap();
        assert!(backend.is_enabled());
        if let Backend::Remote { client, .. } = &backend {
            if std::env::var("API_BASE_URL").is_err() {
                assert_eq!(client.base_url(), "http://127.0.0.1:9");
            }
        }
    }

    #[tokio::test]
    async fn disabled_backend_never_calls_out() {
        let backend = Backend::Disabled;
        assert!(matches!(backend.generate("x").await, Err(StudyError::MissingApiKey)));
        let mut chunks = Vec::new();
        let result = backend.generate_streaming("x", &mut |c: &str| chunks.push(c.to_string())).await;
        assert!(matches!(result, Err(StudyError::MissingApiKey)));
        assert!(chunks.is_empty());
    }
}
