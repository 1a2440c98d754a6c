//! Result types returned by the solve entry points.
//!
//! Everything is serde-serialisable so the CLI `--json` mode and any host
//! application can persist or transmit a result without reshaping it.

use crate::parse::SolutionSection;
use serde::{Deserialize, Serialize};

/// The outcome of one photo-to-solution request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOutput {
    /// Short problem label derived from the response
    /// (via [`crate::parse::extract_problem`]). Used for history records.
    pub problem: String,

    /// Parsed, ordered solution sections. Never empty — unparseable
    /// responses degrade to a single free-text section.
    pub sections: Vec<SolutionSection>,

    /// The cleaned model response the sections were parsed from.
    pub raw: String,

    /// Check-mode verdict: `Some(true)` when the pictured working was judged
    /// correct, `Some(false)` when incorrect, `None` for solve mode or when
    /// no verdict could be read from the answer section.
    pub correct: Option<bool>,

    /// Token and timing statistics for the request.
    pub stats: SolveStats,
}

impl SolveOutput {
    /// The final answer text, if the response contained an `ANSWER:` section.
    pub fn answer(&self) -> Option<&str> {
        self.sections.iter().rev().find_map(|s| match s {
            SolutionSection::Answer { content } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Render the solution as plain text, suitable for writing to a file.
    ///
    /// The shape matches what the parsers read back: a `PROBLEM:` label,
    /// `Step N:` lines, and a trailing `ANSWER:` line.
    pub fn to_plain_text(&self) -> String {
        let mut out = format!("PROBLEM: {}\n\n", self.problem);
        for section in &self.sections {
            match section {
                SolutionSection::Problem { .. } => {}
                SolutionSection::Step { number, content } => {
                    out.push_str(&format!("Step {number}: {content}\n"));
                }
                SolutionSection::Answer { content } => {
                    out.push_str(&format!("\nANSWER: {content}\n"));
                }
                SolutionSection::FreeText { content } => {
                    out.push_str(&format!("{content}\n"));
                }
            }
        }
        out
    }
}

/// Token and timing statistics for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveStats {
    /// Prompt tokens consumed (as reported by the provider).
    pub input_tokens: u64,
    /// Completion tokens generated.
    pub output_tokens: u64,
    /// Wall-clock time for the whole request, including input resolution
    /// and encoding.
    pub total_duration_ms: u64,
    /// Wall-clock time spent in the LLM call, including retries.
    pub llm_duration_ms: u64,
    /// Retries that were needed before the call succeeded.
    pub retries: u32,
}
