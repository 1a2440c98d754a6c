//! Solution-section parser: split a model response into labelled sections.
//!
//! The solve prompt asks the model to answer in a fixed shape —
//! `PROBLEM:` / `SOLUTION:` / `Step N:` / `ANSWER:` — but models drift:
//! headers change case, step numerals go missing, prose appears before any
//! header. This parser is a single forward pass over the lines that tolerates
//! all of that and still produces a usable section list.
//!
//! ## Streaming safety
//!
//! The parser is re-run on the whole accumulated buffer every time a
//! streamed response grows. Because it is a single forward pass with no
//! lookahead beyond the current line, a section that has been closed by a
//! subsequent header can never change on a longer re-parse — only the last,
//! still-open section extends. The UI can therefore re-render on every
//! increment without flicker. `prefix_reparse_is_stable` in the tests pins
//! this down.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One labelled block of a solution response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolutionSection {
    /// Restated problem statement (`PROBLEM:`).
    Problem { content: String },
    /// One numbered working step (`Step N:`).
    Step { number: u32, content: String },
    /// The final answer (`ANSWER:`).
    Answer { content: String },
    /// Anything outside a recognised header.
    FreeText { content: String },
}

impl SolutionSection {
    /// The section body, whatever its kind.
    pub fn content(&self) -> &str {
        match self {
            Self::Problem { content }
            | Self::Step { content, .. }
            | Self::Answer { content }
            | Self::FreeText { content } => content,
        }
    }
}

/// What the accumulation buffer currently belongs to.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Problem,
    Step(u32),
    Answer,
    FreeText,
}

/// `Step<anything>:` header. The numeral group is lax on purpose: models
/// write `Step 2:`, `Step2:`, and occasionally `Step two:` — the caller
/// falls back to previous + 1 when the capture is not a number. A letter
/// directly after "step" (`Steps to verify:`, `Stepping back:`) is prose,
/// not a header, so the group must open with a non-letter when present.
static RE_STEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^step([^:a-z][^:]*)?:\s*(.*)$").expect("valid regex"));

/// Parse a (possibly partial) model response into ordered sections.
///
/// Total function: any input yields at least one section. Input with no
/// recognised headers and no non-blank line degrades to a single
/// [`SolutionSection::FreeText`] wrapping the raw text.
pub fn parse_solution(text: &str) -> Vec<SolutionSection> {
    let mut sections = Vec::new();
    let mut kind: Option<Kind> = None;
    let mut buffer = String::new();
    // Persists across the whole pass so malformed numerals keep monotonic
    // fallback numbering.
    let mut step_no: u32 = 0;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some(rest) = strip_header(trimmed, "problem:") {
            flush(&mut sections, &mut kind, &mut buffer);
            kind = Some(Kind::Problem);
            buffer.push_str(rest.trim());
        } else if strip_header(trimmed, "solution:").is_some() {
            flush(&mut sections, &mut kind, &mut buffer);
            kind = Some(Kind::FreeText);
        } else if let Some(caps) = RE_STEP.captures(trimmed) {
            flush(&mut sections, &mut kind, &mut buffer);
            let number = caps
                .get(1)
                .and_then(|g| g.as_str().trim().parse::<u32>().ok())
                .unwrap_or_else(|| step_no.saturating_add(1));
            step_no = number;
            kind = Some(Kind::Step(number));
            buffer.push_str(caps.get(2).map_or("", |g| g.as_str()).trim());
        } else if let Some(rest) = strip_header(trimmed, "answer:") {
            flush(&mut sections, &mut kind, &mut buffer);
            kind = Some(Kind::Answer);
            buffer.push_str(rest.trim());
        } else {
            if kind.is_none() && !trimmed.is_empty() {
                kind = Some(Kind::FreeText);
            }
            if kind.is_some() {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(line);
            }
        }
    }

    flush(&mut sections, &mut kind, &mut buffer);

    if sections.is_empty() {
        // All-blank or empty input; keep the raw text so nothing is lost.
        sections.push(SolutionSection::FreeText {
            content: text.to_string(),
        });
    }

    sections
}

/// Case-insensitive header check; returns the line remainder on a hit.
fn strip_header<'a>(line: &'a str, header: &str) -> Option<&'a str> {
    // `get` keeps this safe when the line starts with multi-byte characters.
    match line.get(..header.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(header) => Some(&line[header.len()..]),
        _ => None,
    }
}

/// Emit the buffered content as a section of the current kind.
///
/// No-op when the trimmed buffer is empty, so blank-bodied headers (a bare
/// `SOLUTION:` line) produce nothing.
fn flush(sections: &mut Vec<SolutionSection>, kind: &mut Option<Kind>, buffer: &mut String) {
    let content = buffer.trim().to_string();
    if !content.is_empty() {
        if let Some(k) = *kind {
            sections.push(match k {
                Kind::Problem => SolutionSection::Problem { content },
                Kind::Step(number) => SolutionSection::Step { number, content },
                Kind::Answer => SolutionSection::Answer { content },
                Kind::FreeText => SolutionSection::FreeText { content },
            });
        }
    }
    buffer.clear();
    *kind = None;
}

/// Derive a short problem label from a response or raw input.
///
/// Scans for the first `PROBLEM:` line and returns its remainder; otherwise
/// the first non-blank line capped at 100 characters; otherwise the first
/// 100 characters of the whole text. Used to label history records.
pub fn extract_problem(text: &str) -> String {
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = strip_header(trimmed, "problem:") {
            return rest.trim().to_string();
        }
    }

    if let Some(line) = text.lines().map(str::trim).find(|l| !l.is_empty()) {
        return truncate_chars(line, 100);
    }

    truncate_chars(text, 100)
}

/// Char-boundary-safe prefix of at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
