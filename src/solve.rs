//! Eager (single-request) entry points.
//!
//! The simpler API: resolve the photo, call the model, wait for the full
//! response, parse it, return. Use [`crate::stream`] when the host wants to
//! re-render sections while a streamed response is still arriving.

use crate::config::{SolveConfig, TaskKind};
use crate::error::MathSnapError;
use crate::output::{SolveOutput, SolveStats};
use crate::parse::{extract_problem, parse_solution, SolutionSection};
use crate::pipeline::{clean, encode, input, llm};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Solve (or check) a photographed math problem.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a photo
/// * `config` — Request configuration
///
/// # Errors
/// Returns `Err(MathSnapError)` for fatal errors:
/// - File not found / permission denied / not an image
/// - No provider configured
/// - LLM call failed after all retries
pub async fn solve(
    input_str: impl AsRef<str>,
    config: &SolveConfig,
) -> Result<SolveOutput, MathSnapError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting {} request: {}", config.task.as_str(), input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    // ── Step 2: Get/create provider ──────────────────────────────────────
    let provider = resolve_provider(config)?;

    // ── Step 3: Encode the photo ─────────────────────────────────────────
    let image_data = encode::encode_image(resolved.path(), config.max_image_pixels)?;

    // ── Step 4: Call the vision model ────────────────────────────────────
    let attempt = llm::request_solution(&provider, image_data, config).await;
    if let Some(detail) = attempt.error {
        return Err(MathSnapError::LlmFailed {
            retries: config.max_retries,
            detail,
        });
    }

    // ── Step 5: Clean and parse the response ─────────────────────────────
    let raw = clean::clean_response(&attempt.content);
    let sections = parse_solution(&raw);
    let problem = extract_problem(&raw);
    debug!("Parsed {} sections", sections.len());

    let correct = match config.task {
        TaskKind::Check => verdict(&sections),
        TaskKind::Solve => None,
    };

    let stats = SolveStats {
        input_tokens: attempt.input_tokens,
        output_tokens: attempt.output_tokens,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        llm_duration_ms: attempt.duration_ms,
        retries: attempt.retries,
    };

    info!(
        "{} complete: {} sections, {}ms total",
        config.task.as_str(),
        sections.len(),
        stats.total_duration_ms
    );

    Ok(SolveOutput {
        problem,
        sections,
        raw,
        correct,
        stats,
    })
}

/// Solve a photo held in memory.
///
/// The bytes are written to a managed [`tempfile`] and cleaned up
/// automatically on return or panic. This is the recommended API when the
/// photo comes from a camera buffer or network stream rather than a file.
pub async fn solve_from_bytes(
    bytes: &[u8],
    config: &SolveConfig,
) -> Result<SolveOutput, MathSnapError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| MathSnapError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| MathSnapError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `solve` returns
    solve(&path, config).await
}

/// Solve a photographed problem and write the plain-text rendering to a file.
///
/// Returns the full [`SolveOutput`] so the caller can still inspect sections
/// and stats after the write.
pub async fn solve_to_file(
    input_str: impl AsRef<str>,
    output_path: &Path,
    config: &SolveConfig,
) -> Result<SolveOutput, MathSnapError> {
    let output = solve(input_str, config).await?;
    write_output(output_path, &output.to_plain_text()).await?;
    info!("Wrote solution to {}", output_path.display());
    Ok(output)
}

async fn write_output(path: &Path, contents: &str) -> Result<(), MathSnapError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| MathSnapError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Synchronous wrapper around [`solve`].
///
/// Creates a temporary tokio runtime internally.
pub fn solve_sync(
    input_str: impl AsRef<str>,
    config: &SolveConfig,
) -> Result<SolveOutput, MathSnapError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MathSnapError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(solve(input_str, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Read the check-mode verdict off the answer section.
///
/// The check prompt asks for `ANSWER: Correct …` or `ANSWER: Incorrect …`;
/// "incorrect" must be tested first because it contains "correct".
fn verdict(sections: &[SolutionSection]) -> Option<bool> {
    let answer = sections.iter().rev().find_map(|s| match s {
        SolutionSection::Answer { content } => Some(content.to_lowercase()),
        _ => None,
    })?;

    if answer.contains("incorrect") || answer.contains("wrong") {
        Some(false)
    } else if answer.contains("correct") {
        Some(true)
    } else {
        None
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, MathSnapError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        MathSnapError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. Pre-built provider (`config.provider`) — used as-is. Useful in tests
///    or when the caller wraps the provider in custom middleware.
/// 2. Named provider (`config.provider_name`) — the factory reads the
///    matching API key (`OPENAI_API_KEY`, etc.) from the environment.
/// 3. `MATHSNAP_LLM_PROVIDER` + `MATHSNAP_MODEL` env pair — honoured when
///    both are set, so a shell script or CI job can pin the model even when
///    several API keys are present.
/// 4. Auto-detection via [`ProviderFactory::from_env`], with an explicit
///    preference for OpenAI when its key exists so users holding multiple
///    keys get a deterministic default.
fn resolve_provider(config: &SolveConfig) -> Result<Arc<dyn LLMProvider>, MathSnapError> {
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_vision_provider(name, model);
    }

    // 3) Honour MATHSNAP_LLM_PROVIDER + MATHSNAP_MODEL when both set
    if let (Ok(prov), Ok(model)) = (
        std::env::var("MATHSNAP_LLM_PROVIDER"),
        std::env::var("MATHSNAP_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    // Prefer OpenAI explicitly when an OpenAI API key is present.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| MathSnapError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
