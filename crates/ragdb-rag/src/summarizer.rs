//! Summarizer adapters: the HTTP chat-style service client and a
//! deterministic template double for tests and offline runs.

use async_trait::async_trait;
use ragdb_core::config::SummarizerConfig;
use ragdb_core::traits::Summarizer;
use ragdb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const GROUNDED_INSTRUCTION: &str = "You answer questions using only the provided context \
passages. Summarize what the context says about the question. If the context does not \
cover the question, say so.";

const NO_CONTEXT_INSTRUCTION: &str = "No grounding context was found for this question. \
State clearly that nothing relevant was retrieved; do not invent an answer from outside \
knowledge.";

/// Chat-style JSON adapter: POST `{endpoint}/chat/completions`, answer taken
/// verbatim from the first choice.
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl HttpSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Summarization(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, query: &str, context: Option<&str>) -> Result<String> {
        let (system, user) = match context {
            Some(ctx) => (
                GROUNDED_INSTRUCTION,
                format!("Question: {query}\n\nContext:\n{ctx}"),
            ),
            None => (NO_CONTEXT_INSTRUCTION, format!("Question: {query}")),
        };

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system.to_string() },
                ChatMessage { role: "user", content: user },
            ],
        };

        let url = format!("{}/chat/completions", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Summarization(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Summarization(format!("{status} from {url}: {detail}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Summarization(format!("bad response body: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Summarization("response contained no choices".into()))
    }
}

/// Deterministic summarizer double: a fixed template echoing the context,
/// so end-to-end tests can assert on the output.
pub struct TemplateSummarizer;

#[async_trait]
impl Summarizer for TemplateSummarizer {
    async fn summarize(&self, query: &str, context: Option<&str>) -> Result<String> {
        Ok(match context {
            Some(ctx) => format!("Summary for '{query}': {}", snippet(ctx, 240)),
            None => format!("No relevant context was found for '{query}'."),
        })
    }
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}

/// Factory honoring the `APP_USE_FAKE_SUMMARIZER` escape hatch.
pub fn default_summarizer(config: &SummarizerConfig) -> Result<Arc<dyn Summarizer>> {
    let use_fake = std::env::var("APP_USE_FAKE_SUMMARIZER")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        warn!("APP_USE_FAKE_SUMMARIZER set, using template summarizer");
        return Ok(Arc::new(TemplateSummarizer));
    }
    Ok(Arc::new(HttpSummarizer::new(config)?))
}
