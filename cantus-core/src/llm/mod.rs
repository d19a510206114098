//! Chat-completion client and concurrent candidate generation.
//!
//! ## Retry policy (per attempt)
//!
//! Up to `max_retries` tries. Connect errors, timeouts, and the retryable
//! status set {429, 502, 503, 504} back off exponentially from
//! `retry_base_delay`, doubling each retry (plus optional jitter). Any other
//! non-success status or a malformed body fails the attempt immediately.
//!
//! ## Fan-out (n > 1)
//!
//! Attempts run as independent `JoinSet` tasks; each failure is captured,
//! logged, and dropped from the pool. The batch fails only when every
//! attempt failed.

pub mod wire;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{CantusError, Result};
pub use wire::ChatMessage;

const RETRYABLE_STATUS: [u16; 4] = [429, 502, 503, 504];

/// Connection settings for an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL; `/v1` and `/chat/completions` suffixes are both accepted.
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-request network timeout.
    pub timeout: Duration,
    /// Maximum tries per attempt. Default: 3.
    pub max_retries: u32,
    /// First backoff delay; doubles each retry. Default: 500 ms.
    pub retry_base_delay: Duration,
    /// Apply up to +25 % multiplicative jitter to backoff delays.
    /// Disable for deterministic tests.
    pub retry_jitter: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/v1".into(),
            api_key: None,
            timeout: Duration::from_secs(120),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            retry_jitter: true,
        }
    }
}

/// Sampling parameters forwarded to the backend.
#[derive(Debug, Clone)]
pub struct ChatParams {
    /// Explicit model id; `None` resolves via the models listing.
    pub model: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub repetition_penalty: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.8,
            top_p: 0.95,
            max_tokens: 2048,
            repetition_penalty: 1.1,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }
}

/// Async chat-completion client with bounded retries and a process-lifetime
/// default-model cache.
pub struct LlmClient {
    http: reqwest::Client,
    chat_url: String,
    models_url: String,
    api_key: Option<String>,
    max_retries: u32,
    retry_base_delay: Duration,
    retry_jitter: bool,
    /// Write-once default model id, resolved from the models listing on
    /// first use. The mutex spans the listing call so concurrent first
    /// users trigger exactly one network request.
    default_model: tokio::sync::Mutex<Option<String>>,
}

enum AttemptError {
    Retryable(CantusError),
    Fatal(CantusError),
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CantusError::Backend(format!("client build failed: {e}")))?;
        Ok(Self {
            http,
            chat_url: resolve_chat_url(&config.base_url),
            models_url: resolve_models_url(&config.base_url),
            api_key: config.api_key,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
            retry_jitter: config.retry_jitter,
            default_model: tokio::sync::Mutex::new(None),
        })
    }

    /// One chat-completion request with the configured retry policy.
    ///
    /// # Errors
    /// The last attempt's error after retries are exhausted, or the first
    /// non-retryable failure.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        params: &ChatParams,
        model: &str,
    ) -> Result<String> {
        let payload = wire::ChatRequest {
            model,
            messages,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            repeat_penalty: params.repetition_penalty,
            repetition_penalty: params.repetition_penalty,
            presence_penalty: params.presence_penalty,
            frequency_penalty: params.frequency_penalty,
        };
        debug!(url = %self.chat_url, model, "sending chat request");

        let mut last_error: Option<CantusError> = None;
        for attempt in 0..self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.backoff_delay(attempt - 1)).await;
            }
            match self.post_chat_once(&payload).await {
                Ok(text) => return Ok(text),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retryable(e)) => {
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "retryable chat failure"
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| CantusError::Backend("all retry attempts failed".into())))
    }

    async fn post_chat_once(
        &self,
        payload: &wire::ChatRequest<'_>,
    ) -> std::result::Result<String, AttemptError> {
        let mut request = self.http.post(&self.chat_url).json(payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() || e.is_connect() => {
                return Err(AttemptError::Retryable(CantusError::Backend(e.to_string())))
            }
            Err(e) => return Err(AttemptError::Fatal(CantusError::Backend(e.to_string()))),
        };

        let status = response.status().as_u16();
        if RETRYABLE_STATUS.contains(&status) {
            return Err(AttemptError::Retryable(CantusError::BackendStatus {
                status,
            }));
        }
        if !response.status().is_success() {
            return Err(AttemptError::Fatal(CantusError::BackendStatus { status }));
        }

        let completion: wire::ChatCompletion = response
            .json()
            .await
            .map_err(|e| AttemptError::Fatal(CantusError::MalformedResponse(e.to_string())))?;
        completion.into_text().map_err(AttemptError::Fatal)
    }

    fn backoff_delay(&self, retry_index: u32) -> Duration {
        let base = self.retry_base_delay.as_secs_f64() * 2f64.powi(retry_index as i32);
        let secs = if self.retry_jitter {
            base * (1.0 + rand::thread_rng().gen::<f64>() * 0.25)
        } else {
            base
        };
        Duration::from_secs_f64(secs)
    }

    /// Produce between 1 and `n` candidate texts.
    ///
    /// For `n == 1` the single attempt's failure propagates unmasked. For
    /// `n > 1` attempts run concurrently; failed attempts are dropped from
    /// the result set (preserving attempt order among the survivors), and
    /// only an empty set raises [`CantusError::AllCandidatesFailed`].
    pub async fn generate_candidates(
        self: Arc<Self>,
        messages: &[ChatMessage],
        params: &ChatParams,
        model: &str,
        n: usize,
    ) -> Result<Vec<String>> {
        if n <= 1 {
            let text = self.chat(messages, params, model).await?;
            return Ok(vec![text]);
        }

        let mut set = JoinSet::new();
        for attempt_index in 0..n {
            let client = Arc::clone(&self);
            let messages = messages.to_vec();
            let params = params.clone();
            let model = model.to_string();
            set.spawn(async move {
                (
                    attempt_index,
                    client.chat(&messages, &params, &model).await,
                )
            });
        }

        let mut outcomes: Vec<Option<String>> = (0..n).map(|_| None).collect();
        let mut failed = 0usize;
        let mut last_error: Option<String> = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(text))) => outcomes[index] = Some(text),
                Ok((index, Err(e))) => {
                    warn!(attempt = index, error = %e, "candidate attempt failed");
                    failed += 1;
                    last_error = Some(e.to_string());
                }
                Err(e) => {
                    warn!(error = %e, "candidate attempt task failed");
                    failed += 1;
                    last_error = Some(e.to_string());
                }
            }
        }

        let texts: Vec<String> = outcomes.into_iter().flatten().collect();
        if texts.is_empty() {
            return Err(CantusError::AllCandidatesFailed {
                attempted: n,
                last_error: last_error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        debug!(
            requested = n,
            produced = texts.len(),
            failed,
            "candidate generation complete"
        );
        Ok(texts)
    }

    /// Resolve the model id to use for a request.
    ///
    /// An explicit non-empty `requested` id wins. Otherwise the first id
    /// from the models listing is fetched once per process and cached;
    /// concurrent first callers serialize on the cache mutex so exactly one
    /// listing request is issued.
    pub async fn resolve_model(&self, requested: Option<&str>) -> Result<String> {
        if let Some(model) = requested {
            if !model.is_empty() {
                return Ok(model.to_string());
            }
        }
        let mut slot = self.default_model.lock().await;
        if let Some(model) = slot.as_ref() {
            return Ok(model.clone());
        }
        let models = self.list_models().await?;
        let first = models
            .into_iter()
            .next()
            .ok_or(CantusError::NoModelsAvailable)?;
        info!(model = %first, "resolved default model from models listing");
        *slot = Some(first.clone());
        Ok(first)
    }

    /// Model identifiers advertised by the backend, in listing order.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let mut request = self.http.get(&self.models_url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| CantusError::Backend(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CantusError::BackendStatus {
                status: status.as_u16(),
            });
        }
        let listing: wire::ModelList = response
            .json()
            .await
            .map_err(|e| CantusError::MalformedResponse(e.to_string()))?;
        Ok(listing.ids())
    }
}

fn resolve_chat_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else if base.ends_with("/v1") {
        format!("{base}/chat/completions")
    } else {
        format!("{base}/v1/chat/completions")
    }
}

fn resolve_models_url(base_url: &str) -> String {
    let mut base = base_url.trim_end_matches('/');
    if base.ends_with("/models") {
        return base.to_string();
    }
    if let Some(stripped) = base.strip_suffix("/chat/completions") {
        base = stripped.trim_end_matches('/');
    }
    if base.ends_with("/v1") {
        format!("{base}/models")
    } else {
        format!("{base}/v1/models")
    }
}
