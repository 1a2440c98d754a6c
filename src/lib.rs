//! # mathsnap
//!
//! Photograph a handwritten math problem, get a step-by-step solution.
//!
//! ## Why this crate?
//!
//! OCR pipelines built for printed text mangle handwritten mathematics —
//! fraction bars, superscripts, and crossed-out working come out as noise.
//! Instead this crate hands the photo to a vision language model, asks it to
//! answer in a fixed `PROBLEM / SOLUTION / Step N / ANSWER` shape, and parses
//! that response into typed sections and LaTeX math segments the host
//! application can render.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo
//!  │
//!  ├─ 1. Input   resolve local file or download from URL
//!  ├─ 2. Encode  decode, downscale, PNG → base64 ImageData
//!  ├─ 3. VLM     gpt-4.1-nano / claude / gemini / … with retry + backoff
//!  ├─ 4. Clean   strip fences, normalise whitespace, drop invisible chars
//!  └─ 5. Parse   sections (PROBLEM/Step/ANSWER) + math segments ($…$, $$…$$)
//! ```
//!
//! Both parsers are total: any input, however malformed, produces at least
//! one section/segment and never an error. Garbage degrades to free text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mathsnap::{solve, SolveConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = SolveConfig::default();
//!     let output = solve("homework.jpg", &config).await?;
//!     println!("{}", output.problem);
//!     for section in &output.sections {
//!         println!("{}", section.content());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mathsnap` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! mathsnap = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod history;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod prompts;
pub mod solve;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SolveConfig, SolveConfigBuilder, TaskKind};
pub use error::MathSnapError;
pub use history::{HistoryRecord, HistoryStore};
pub use output::{SolveOutput, SolveStats};
pub use parse::{
    extract_problem, group_rows, parse_math_segments, parse_solution, MathSegment, SegmentKind,
    SolutionSection,
};
pub use solve::{solve, solve_from_bytes, solve_sync, solve_to_file};
pub use stream::{section_snapshots, SectionStream};
