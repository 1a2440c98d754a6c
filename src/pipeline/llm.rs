//! Vision-LLM interaction: build the chat request and call the provider.
//!
//! This module converts an encoded photo into a vision API call and returns
//! the raw response text. It is intentionally thin — all prompt engineering
//! lives in [`crate::prompts`] so it can be changed without touching retry
//! or error-handling logic here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent.
//! Exponential backoff (`retry_backoff_ms * 2^attempt`) avoids hammering a
//! recovering endpoint: with 500 ms base and 3 retries the wait sequence is
//! 500 ms → 1 s → 2 s, totalling < 4 s of back-off per request.

use crate::config::SolveConfig;
use crate::prompts::default_prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// The raw outcome of one vision call, before cleaning and parsing.
#[derive(Debug, Clone)]
pub struct SolveAttempt {
    /// Raw response text; empty when `error` is set.
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
    /// Retries that were spent (0 = first attempt succeeded).
    pub retries: u32,
    /// Human-readable failure description after all retries, if any.
    pub error: Option<String>,
}

/// Send the photo to the vision model and return its response.
///
/// ## Message Layout
///
/// 1. **System message** — the solve or check prompt (or caller override)
/// 2. **User message** — the photo as a base64 image attachment (empty text)
///
/// The empty user text is intentional: vision APIs require at least one
/// user turn to respond to, but the image carries all the actual content.
///
/// Always returns a `SolveAttempt` — the caller inspects `attempt.error`
/// and maps it onto [`crate::error::MathSnapError`]; keeping the error as
/// data here makes the retry loop trivial to test.
pub async fn request_solution(
    provider: &Arc<dyn LLMProvider>,
    image_data: ImageData,
    config: &SolveConfig,
) -> SolveAttempt {
    let start = Instant::now();
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or_else(|| default_prompt(config.task));

    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user_with_images("", vec![image_data]),
    ];

    let options = build_options(config);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = timeout(
            Duration::from_secs(config.api_timeout_secs),
            provider.chat(&messages, Some(&options)),
        );

        match call.await {
            Err(_) => {
                let err_msg = format!("timed out after {}s", config.api_timeout_secs);
                warn!("attempt {} failed — {}", attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                debug!(
                    "{} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens, response.completion_tokens, duration
                );

                return SolveAttempt {
                    content: response.content,
                    input_tokens: response.prompt_tokens as u64,
                    output_tokens: response.completion_tokens as u64,
                    duration_ms: duration.as_millis() as u64,
                    retries: attempt,
                    error: None,
                };
            }
            Ok(Err(e)) => {
                let err_msg = format!("{}", e);
                warn!("attempt {} failed — {}", attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    let duration = start.elapsed();
    SolveAttempt {
        content: String::new(),
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: duration.as_millis() as u64,
        retries: config.max_retries,
        error: Some(last_err.unwrap_or_else(|| "Unknown error".to_string())),
    }
}

/// Back-off before retry `attempt` (1-based). Saturates rather than
/// overflowing for absurd retry counts.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    base.saturating_mul(2u64.saturating_pow(attempt - 1))
}

/// Build `CompletionOptions` from the solve config.
fn build_options(config: &SolveConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_saturates() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 3), 2000);
        // Huge retry counts must not overflow.
        assert_eq!(backoff_ms(500, 80), u64::MAX);
        assert_eq!(backoff_ms(u64::MAX, 2), u64::MAX);
    }

    #[test]
    fn build_options_defaults() {
        let config = SolveConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(2048));
    }
}
