//! Chat-completion client for the three per-file analyses: quality,
//! security, and improvement suggestions.
//!
//! Each analysis posts a two-message prompt (system persona + user code
//! block) to `{base_url}/v1/chat/completions` and parses the response as
//! JSON. Two failure modes are absorbed rather than propagated, per the
//! degraded-mode contract: no API key configured, or the HTTP call itself
//! fails. In both cases the caller gets a canned neutral response instead
//! of an error — the pipeline must always make forward progress.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    config::LlmConfig,
    error::{make_snippet, AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind},
    prompts::{
        degraded_quality_report, degraded_security_issues, degraded_suggestions,
        parse_quality_response, parse_security_response, parse_suggestions_response,
        quality_system_prompt, quality_user_prompt, security_system_prompt,
        security_user_prompt, suggestions_system_prompt, suggestions_user_prompt, IssueRecord,
        QualityReport, SuggestionRecord,
    },
};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client for the three prompted analyses the file analyzer runs per
/// changed file.
#[derive(Debug)]
pub struct LlmClient {
    http: reqwest::Client,
    cfg: LlmConfig,
    url_chat: String,
}

impl LlmClient {
    /// Builds a client from `cfg`. Never fails on a missing API key — that
    /// puts the client into degraded mode instead, matching the
    /// always-make-progress contract. Only fails if the HTTP client itself
    /// cannot be constructed (a malformed API key header).
    pub fn new(cfg: LlmConfig) -> Result<Self, AiLlmError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = &cfg.api_key {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                    ProviderError::new(
                        Provider::Chat,
                        ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                    )
                })?,
            );
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        let url_chat = format!("{}/v1/chat/completions", cfg.base_url);

        info!(
            model = %cfg.model,
            base_url = %cfg.base_url,
            degraded = cfg.is_degraded(),
            "llm client initialized"
        );

        Ok(Self { http, cfg, url_chat })
    }

    /// Runs the quality analysis. Never returns an error — any backend
    /// failure degrades to [`crate::prompts::degraded_quality_report`].
    pub async fn analyze_quality(
        &self,
        file_content: &str,
        file_path: &str,
        detected_language: &str,
    ) -> QualityReport {
        if self.cfg.is_degraded() {
            return degraded_quality_report();
        }
        let system = quality_system_prompt(detected_language);
        let user = quality_user_prompt(file_path, file_content);
        match self.call(&system, &user).await {
            Ok(raw) => parse_quality_response(&raw),
            Err(e) => {
                warn!(error = %e, file = %file_path, "quality analysis failed, degrading");
                degraded_quality_report()
            }
        }
    }

    /// Runs the security analysis. Never returns an error.
    pub async fn analyze_security(
        &self,
        file_content: &str,
        file_path: &str,
        detected_language: &str,
    ) -> Vec<IssueRecord> {
        if self.cfg.is_degraded() {
            return degraded_security_issues();
        }
        let system = security_system_prompt(detected_language);
        let user = security_user_prompt(file_path, file_content);
        match self.call(&system, &user).await {
            Ok(raw) => parse_security_response(&raw),
            Err(e) => {
                warn!(error = %e, file = %file_path, "security analysis failed, degrading");
                degraded_security_issues()
            }
        }
    }

    /// Runs the improvement-suggestion analysis. Never returns an error.
    pub async fn generate_suggestions(
        &self,
        file_content: &str,
        file_path: &str,
        detected_language: &str,
    ) -> Vec<SuggestionRecord> {
        if self.cfg.is_degraded() {
            return degraded_suggestions();
        }
        let system = suggestions_system_prompt(detected_language);
        let user = suggestions_user_prompt(file_path, file_content);
        match self.call(&system, &user).await {
            Ok(raw) => parse_suggestions_response(&raw),
            Err(e) => {
                warn!(error = %e, file = %file_path, "suggestion generation failed, degrading");
                degraded_suggestions()
            }
        }
    }

    /// Posts the two-message prompt and returns the assistant's raw text.
    async fn call(&self, system: &str, user: &str) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest {
            model: &self.cfg.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.cfg.temperature,
            max_tokens: self.cfg.max_tokens,
        };

        debug!(
            model = %self.cfg.model,
            url = %self.url_chat,
            prompt_len = user.len(),
            "POST {}", self.url_chat
        );

        let resp = self.http.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "chat completion returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::Chat,
                ProviderErrorKind::HttpStatus(HttpError { status, url, snippet }),
            )
            .into());
        }

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode chat completion response"
                );
                return Err(ProviderError::new(
                    Provider::Chat,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `choices[0].message.content`"
                    )),
                )
                .into());
            }
        };

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ProviderError::new(Provider::Chat, ProviderErrorKind::EmptyChoices))?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            "chat completion succeeded"
        );

        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degraded_cfg() -> LlmConfig {
        LlmConfig {
            base_url: "https://api.example.com".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.1,
            max_tokens: 4000,
        }
    }

    #[tokio::test]
    async fn degraded_client_never_calls_network() {
        let client = LlmClient::new(degraded_cfg()).expect("client builds without api key");
        let report = client.analyze_quality("fn main() {}", "src/main.rs", "rust").await;
        assert_eq!(report.score, 5.0);
        assert_eq!(report.issues.len(), 1);
    }
}
