//! External language model access.
//!
//! [`ModelClient`] is the only contract the orchestrator relies on: a text prompt goes in, text
//! comes out, or the call fails. Nothing in the response is parsed beyond its raw text.
//!
//! [`GeminiClient`] implements it over the Gemini `generateContent` REST method. The client sets
//! no request timeout and performs no retries; a hung upstream call hangs the request.

use crate::config::GeminiConfig;
use crate::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Short identifier used in logs, such as the model name.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentReq<'a> {
    contents: Vec<ReqContent<'a>>,
}

#[derive(Debug, Serialize)]
struct ReqContent<'a> {
    role: &'static str,
    parts: Vec<ReqPart<'a>>,
}

#[derive(Debug, Serialize)]
struct ReqPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRes {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResPart>,
}

#[derive(Debug, Deserialize)]
struct ResPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Extracts the concatenated text of the first candidate from a `generateContent` body.
fn response_text(body: &str) -> Result<String, ModelError> {
    let parsed: GenerateContentRes = serde_json::from_str(body).map_err(ModelError::Decode)?;

    if let Some(reason) = parsed
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        return Err(ModelError::Blocked(reason));
    }

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        return Err(ModelError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return match candidate.finish_reason {
            Some(reason) if reason != "STOP" => Err(ModelError::Blocked(reason)),
            _ => Err(ModelError::EmptyResponse),
        };
    }

    Ok(text)
}

/// Gemini REST client.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    cfg: Arc<GeminiConfig>,
}

impl GeminiClient {
    pub fn new(cfg: Arc<GeminiConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            cfg,
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        self.cfg.model()
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let body = GenerateContentReq {
            contents: vec![ReqContent {
                role: "user",
                parts: vec![ReqPart { text: prompt }],
            }],
        };

        tracing::debug!(model = self.cfg.model(), "calling generateContent");

        let response = self
            .http
            .post(self.cfg.generate_content_url())
            .header("x-goog-api-key", self.cfg.api_key())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        response_text(&text)
    }
}
