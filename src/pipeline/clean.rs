//! Response cleanup: deterministic fixes for model quirks, applied before
//! parsing.
//!
//! Even well-prompted models occasionally wrap the whole answer in
//! ` ```fences``` ` despite the prompt saying not to, emit Windows line
//! endings, or sprinkle zero-width characters into the text. These cheap
//! string rules fix that without touching content, so the section parser
//! sees clean input and the prompt stays focused on *what to produce*, not
//! on formatting edge-cases. Each rule is independently testable.
//!
//! Rules must run in this order: strip fences before anything reads line
//! structure, and normalise line endings before trimming.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw model response.
///
/// Rules (applied in order):
/// 1. Strip outer markdown fences (models sometimes disobey the prompt)
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
pub fn clean_response(input: &str) -> String {
    let s = strip_outer_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    remove_invisible_chars(&s)
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|latex|text)?\n(.*)\n```\s*$").expect("valid regex"));

fn strip_outer_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 5: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_with_and_without_language() {
        assert_eq!(
            strip_outer_fences("```markdown\nANSWER: 4\n```"),
            "ANSWER: 4"
        );
        assert_eq!(strip_outer_fences("```\nANSWER: 4\n```"), "ANSWER: 4");
        assert_eq!(
            strip_outer_fences("```latex\n$$x$$\n```"),
            "$$x$$"
        );
    }

    #[test]
    fn no_fences_passthrough() {
        assert_eq!(strip_outer_fences("ANSWER: 4"), "ANSWER: 4");
    }

    #[test]
    fn normalises_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn trims_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("  hello   \nworld  "),
            "  hello\nworld"
        );
    }

    #[test]
    fn collapses_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn removes_invisible_chars() {
        assert_eq!(
            remove_invisible_chars("hello\u{200B}world\u{FEFF}!\u{00AD}"),
            "helloworld!"
        );
    }

    #[test]
    fn full_pipeline_on_fenced_crlf_response() {
        let input = "```markdown\nPROBLEM: 2+2\r\nSOLUTION:   \r\nStep 1: add\r\nANSWER: 4\n```";
        let cleaned = clean_response(input);
        assert!(cleaned.starts_with("PROBLEM: 2+2"));
        assert!(!cleaned.contains('\r'));
        assert!(!cleaned.contains("```"));
        assert!(!cleaned.contains("SOLUTION:   "));
    }
}
