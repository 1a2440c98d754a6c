//! Configuration types for photo-to-solution requests.
//!
//! All request behaviour is controlled through [`SolveConfig`], built via
//! its [`SolveConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely
//! on well-documented defaults for the rest.

use crate::error::MathSnapError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What the model is asked to do with the photographed problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Solve the problem step by step. (default)
    #[default]
    Solve,
    /// Check the handwritten working and judge it correct or incorrect.
    Check,
}

impl TaskKind {
    /// Stable string form, used in history records and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Solve => "SOLVE",
            TaskKind::Check => "CHECK",
        }
    }

    /// Parse the stable string form; unknown strings fall back to Solve.
    pub fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("check") {
            TaskKind::Check
        } else {
            TaskKind::Solve
        }
    }
}

/// Configuration for a photo-to-solution request.
///
/// Built via [`SolveConfig::builder()`] or using [`SolveConfig::default()`].
///
/// # Example
/// ```rust
/// use mathsnap::{SolveConfig, TaskKind};
///
/// let config = SolveConfig::builder()
///     .task(TaskKind::Check)
///     .model("gpt-4.1-mini")
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SolveConfig {
    /// Whether to solve the problem or check the pictured working. Default: Solve.
    pub task: TaskKind,

    /// LLM model identifier, e.g. "gpt-4.1-nano", "claude-sonnet-4-20250514".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the LLM completion. Default: 0.1.
    ///
    /// Low temperature makes the model deterministic and faithful to what it
    /// sees in the photo — exactly what you want for transcription and
    /// arithmetic. Higher values introduce creativity that worsens accuracy.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate. Default: 2048.
    ///
    /// A multi-step solution with display LaTeX rarely exceeds 1 000 output
    /// tokens; 2 048 leaves headroom without making a runaway response
    /// expensive. Setting this too low truncates the answer mid-step.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient LLM API failure. Default: 3.
    ///
    /// Most 5xx and timeout errors are transient (overloaded backend,
    /// network blip). Permanent errors (bad API key, 400) are not retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Maximum image dimension (width or height) in pixels. Default: 2000.
    ///
    /// Phone cameras produce 4000×3000 photos; vision APIs tile images into
    /// 512 px blocks, so anything beyond ~2000 px costs tokens without
    /// improving recognition of handwriting. Larger images are downscaled
    /// proportionally before upload.
    pub max_image_pixels: u32,

    /// Custom system prompt. If None, uses the built-in prompt for `task`.
    pub system_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            task: TaskKind::default(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 2048,
            max_retries: 3,
            retry_backoff_ms: 500,
            max_image_pixels: 2000,
            system_prompt: None,
            download_timeout_secs: 60,
            api_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for SolveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolveConfig")
            .field("task", &self.task)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("max_image_pixels", &self.max_image_pixels)
            .finish()
    }
}

impl SolveConfig {
    /// Create a new builder for `SolveConfig`.
    pub fn builder() -> SolveConfigBuilder {
        SolveConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SolveConfig`].
#[derive(Debug)]
pub struct SolveConfigBuilder {
    config: SolveConfig,
}

impl SolveConfigBuilder {
    pub fn task(mut self, task: TaskKind) -> Self {
        self.config.task = task;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn max_image_pixels(mut self, px: u32) -> Self {
        self.config.max_image_pixels = px.max(100);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SolveConfig, MathSnapError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(MathSnapError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_image_pixels < 100 {
            return Err(MathSnapError::InvalidConfig(format!(
                "max_image_pixels must be ≥ 100, got {}",
                c.max_image_pixels
            )));
        }
        Ok(self.config)
    }
}
