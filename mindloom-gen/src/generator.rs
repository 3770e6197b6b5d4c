use crate::error::{GenError, Result};
use crate::prompt::PromptSet;
use futures::StreamExt;
use futures::future::BoxFuture;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Callback invoked with the *cumulative* generated text after each chunk,
/// not the delta. Callers that only want the final string pass no callback.
pub type ChunkCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A source of generated content. The production implementation is
/// [`Generator`]; tests substitute canned implementations.
pub trait Generate: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a PromptSet,
        on_chunk: Option<ChunkCallback>,
    ) -> BoxFuture<'a, Result<String>>;
}

/// HTTP client for an OpenAI-compatible chat completions endpoint.
/// Streams server-sent events when a chunk callback is supplied.
pub struct Generator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl Generator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, 120)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Mindloom/0.1 (https://github.com/mindloom/mindloom)")
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(timeout_secs.min(20)))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn request_body(&self, prompt: &PromptSet, stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "stream": stream,
        })
    }

    async fn send(&self, prompt: &PromptSet, stream: bool) -> Result<reqwest::Response> {
        Url::parse(&self.endpoint)
            .map_err(|e| GenError::InvalidEndpoint(format!("{}: {}", self.endpoint, e)))?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&self.request_body(prompt, stream));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            let message = response.text().await.unwrap_or_default();
            return Err(GenError::RateLimited(message));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenError::ProviderError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn request_streaming(
        &self,
        prompt: &PromptSet,
        on_chunk: ChunkCallback,
    ) -> Result<String> {
        let response = self.send(prompt, true).await?;

        let mut body_stream = response.bytes_stream();
        let mut pending = String::new();
        let mut accumulated = String::new();

        while let Some(bytes) = body_stream.next().await {
            let bytes = bytes?;
            pending.push_str(&String::from_utf8_lossy(&bytes));

            // SSE events are newline-delimited; keep any trailing partial line
            // in the buffer until the next network chunk completes it.
            while let Some(newline) = pending.find('\n') {
                let line: String = pending.drain(..=newline).collect();
                let line = line.trim();
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();

                if data == "[DONE]" {
                    pending.clear();
                    break;
                }

                match serde_json::from_str::<Value>(data) {
                    Ok(event) => {
                        if let Some(delta) = event["choices"][0]["delta"]["content"].as_str() {
                            accumulated.push_str(delta);
                            on_chunk(accumulated.clone());
                        }
                    }
                    Err(e) => {
                        warn!("Skipping unparseable stream event: {}", e);
                    }
                }
            }
        }

        if accumulated.is_empty() {
            return Err(GenError::EmptyResponse);
        }

        debug!("Streamed {} chars from {}", accumulated.len(), self.endpoint);
        Ok(accumulated)
    }

    async fn request_blocking(&self, prompt: &PromptSet) -> Result<String> {
        let response = self.send(prompt, false).await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| GenError::MalformedResponse(e.to_string()))?;

        let content = extract_content(&payload).ok_or_else(|| {
            GenError::MalformedResponse(format!("no content field in {}", payload))
        })?;

        if content.trim().is_empty() {
            return Err(GenError::EmptyResponse);
        }
        Ok(content)
    }
}

/// Pull the generated text out of the provider payload, tolerating the
/// handful of response shapes seen in the wild.
fn extract_content(payload: &Value) -> Option<String> {
    let candidates = [
        &payload["choices"][0]["message"]["content"],
        &payload["choices"][0]["text"],
        &payload["content"],
    ];

    for candidate in candidates {
        if let Some(text) = candidate.as_str()
            && !text.trim().is_empty()
        {
            return Some(text.to_string());
        }
    }
    None
}

impl Generate for Generator {
    fn generate<'a>(
        &'a self,
        prompt: &'a PromptSet,
        on_chunk: Option<ChunkCallback>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            match on_chunk {
                Some(callback) => self.request_streaming(prompt, callback).await,
                None => self.request_blocking(prompt).await,
            }
        })
    }
}
