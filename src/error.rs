//! Error types for the mathsnap library.
//!
//! A single fatal error enum covers the whole pipeline: the library works on
//! one photo per call, so unlike a multi-page document converter there is no
//! partial-success case to carry alongside. A failed LLM call after all
//! retries is fatal for the request.
//!
//! The response parsers never contribute variants here — they are total
//! functions that degrade malformed text to plain-text sections instead of
//! failing.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the mathsnap library.
#[derive(Debug, Error)]
pub enum MathSnapError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a supported image format.
    #[error("File is not a PNG/JPEG/WebP image: '{path}'\nFirst bytes: {magic:?}")]
    NotAnImage { path: PathBuf, magic: [u8; 4] },

    /// The image had a valid signature but could not be decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageDecodeFailed { path: PathBuf, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM call failed after all retries.
    #[error("LLM call failed after {retries} retries: {detail}")]
    LlmFailed { retries: u32, detail: String },

    /// Vision API returned HTTP 429 — caller should back off.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// Vision API call timed out — the caller may retry.
    #[error("API call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    /// Vision API returned an authentication error (401/403) — retry unlikely to help.
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── History errors ────────────────────────────────────────────────────
    /// The local history database failed.
    #[error("History database error: {0}")]
    History(#[from] rusqlite::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_failed_display() {
        let e = MathSnapError::LlmFailed {
            retries: 3,
            detail: "503 from backend".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("3 retries"), "got: {msg}");
        assert!(msg.contains("503"));
    }

    #[test]
    fn rate_limit_display_with_and_without_retry() {
        let with = MathSnapError::RateLimitExceeded {
            provider: "openai".into(),
            retry_after_secs: Some(60),
        };
        assert!(with.to_string().contains("openai"));

        let without = MathSnapError::RateLimitExceeded {
            provider: "gemini".into(),
            retry_after_secs: None,
        };
        assert!(without.to_string().contains("gemini"));
    }

    #[test]
    fn not_an_image_display_includes_magic() {
        let e = MathSnapError::NotAnImage {
            path: PathBuf::from("/tmp/x.bin"),
            magic: *b"GIF8",
        };
        assert!(e.to_string().contains("x.bin"));
    }

    #[test]
    fn history_error_converts_from_rusqlite() {
        let e: MathSnapError = rusqlite::Error::InvalidQuery.into();
        assert!(e.to_string().contains("History database"));
    }
}
