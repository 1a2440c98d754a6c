//! Math-segment parser: split text into plain, bold, and LaTeX math runs.
//!
//! Vision models asked for LaTeX answer with a mix of prose and delimited
//! math — `The roots are $x_1=2$ and $$x = \frac{-b}{2a}$$` — and renderers
//! need to know which run is which. This module scans a string for the four
//! common LaTeX delimiter pairs plus markdown bold and produces an ordered
//! segment list.
//!
//! ## Matching rules
//!
//! The scanner repeatedly takes the *left-most* delimiter match in the
//! unconsumed suffix. When two patterns start at the same offset, the
//! earlier entry in [`PATTERNS`] wins — `$$` before `$` is what makes
//! display math unambiguous. Unbalanced delimiters (a lone `$`) never match
//! and survive as plain text; this is deliberately not a full LaTeX
//! tokenizer, just enough for near-formulaic LLM output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a [`MathSegment`] should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Plain prose, whitespace-collapsed.
    Text,
    /// Markdown-bold prose (`**…**`).
    BoldText,
    /// Math that flows within a line (`$…$` or `\(…\)`).
    InlineMath,
    /// Math on its own visual line (`$$…$$` or `\[…\]`).
    DisplayMath,
}

/// One typed run of a parsed string.
///
/// Produced fresh per [`parse_math_segments`] call; plain value, nothing
/// shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathSegment {
    pub content: String,
    pub kind: SegmentKind,
}

impl MathSegment {
    fn new(content: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }
}

/// Delimiter patterns in tie-breaking priority order.
///
/// `(?s)` on the math pairs lets display blocks span newlines; the inline
/// `$…$` interior excludes `$` so `$$` never half-matches as two inline
/// regions.
static PATTERNS: Lazy<Vec<(Regex, SegmentKind)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?s)\$\$(.+?)\$\$").expect("valid regex"),
            SegmentKind::DisplayMath,
        ),
        (
            Regex::new(r"(?s)\\\[(.+?)\\\]").expect("valid regex"),
            SegmentKind::DisplayMath,
        ),
        (
            Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"),
            SegmentKind::BoldText,
        ),
        (
            Regex::new(r"\$([^$]+)\$").expect("valid regex"),
            SegmentKind::InlineMath,
        ),
        (
            Regex::new(r"(?s)\\\((.+?)\\\)").expect("valid regex"),
            SegmentKind::InlineMath,
        ),
    ]
});

/// Parse a string into an ordered sequence of typed segments.
///
/// Always returns at least one segment: if the scan yields nothing (empty
/// or all-whitespace input) the result is a single [`SegmentKind::Text`]
/// segment holding the raw input, so callers never branch on an empty list.
pub fn parse_math_segments(text: &str) -> Vec<MathSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let rest = &text[cursor..];

        // Left-most match across all patterns; ties broken by pattern order.
        let mut best: Option<(usize, usize, usize)> = None; // (start, end, pattern idx)
        for (idx, (re, _)) in PATTERNS.iter().enumerate() {
            if let Some(m) = re.find(rest) {
                let better = match best {
                    None => true,
                    Some((start, _, _)) => m.start() < start,
                };
                if better {
                    best = Some((m.start(), m.end(), idx));
                }
            }
        }

        let Some((start, end, idx)) = best else {
            break;
        };

        push_text(&mut segments, &rest[..start]);

        let (re, kind) = &PATTERNS[idx];
        let inner = re
            .captures(&rest[start..end])
            .and_then(|c| c.get(1))
            .map(|g| g.as_str().trim().to_string())
            .unwrap_or_default();
        if !inner.is_empty() {
            segments.push(MathSegment::new(inner, *kind));
        }

        cursor += end;
    }

    push_text(&mut segments, &text[cursor..]);

    if segments.is_empty() {
        // Guarantee a non-empty result; keep the original text untouched.
        segments.push(MathSegment::new(text, SegmentKind::Text));
    }

    segments
}

/// Append a whitespace-collapsed plain-text segment, dropping blanks.
fn push_text(segments: &mut Vec<MathSegment>, raw: &str) {
    let collapsed = collapse_whitespace(raw);
    if !collapsed.is_empty() {
        segments.push(MathSegment::new(collapsed, SegmentKind::Text));
    }
}

/// Collapse consecutive whitespace (including newlines) to single spaces.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Group segments into renderable rows.
///
/// Consecutive non-display segments share a flowed row; every
/// [`SegmentKind::DisplayMath`] segment starts (and ends) its own row.
/// Original order is preserved.
pub fn group_rows(segments: &[MathSegment]) -> Vec<Vec<MathSegment>> {
    let mut rows: Vec<Vec<MathSegment>> = Vec::new();
    let mut current: Vec<MathSegment> = Vec::new();

    for seg in segments {
        if seg.kind == SegmentKind::DisplayMath {
            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            rows.push(vec![seg.clone()]);
        } else {
            current.push(seg.clone());
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(content: &str, kind: SegmentKind) -> MathSegment {
        MathSegment::new(content, kind)
    }

    #[test]
    fn plain_text_is_single_segment() {
        let segs = parse_math_segments("just some  words");
        assert_eq!(segs, vec![seg("just some words", SegmentKind::Text)]);
    }

    #[test]
    fn empty_input_falls_back_to_raw_text() {
        assert_eq!(parse_math_segments(""), vec![seg("", SegmentKind::Text)]);
        assert_eq!(
            parse_math_segments("   \n "),
            vec![seg("   \n ", SegmentKind::Text)]
        );
    }

    #[test]
    fn inline_math_splits_surrounding_text() {
        let segs = parse_math_segments("The answer is $x=5$.");
        assert_eq!(
            segs,
            vec![
                seg("The answer is", SegmentKind::Text),
                seg("x=5", SegmentKind::InlineMath),
                seg(".", SegmentKind::Text),
            ]
        );
    }

    #[test]
    fn display_math_whole_input() {
        let segs = parse_math_segments("$$x^2+1$$");
        assert_eq!(segs, vec![seg("x^2+1", SegmentKind::DisplayMath)]);
    }

    #[test]
    fn double_dollar_beats_inline_at_same_offset() {
        let segs = parse_math_segments("$$a+b$$ then $c$");
        assert_eq!(
            segs,
            vec![
                seg("a+b", SegmentKind::DisplayMath),
                seg("then", SegmentKind::Text),
                seg("c", SegmentKind::InlineMath),
            ]
        );
    }

    #[test]
    fn display_math_spans_newlines() {
        let segs = parse_math_segments("before \\[\nx = 1\n\\] after");
        assert_eq!(
            segs,
            vec![
                seg("before", SegmentKind::Text),
                seg("x = 1", SegmentKind::DisplayMath),
                seg("after", SegmentKind::Text),
            ]
        );
    }

    #[test]
    fn escaped_paren_inline_math() {
        let segs = parse_math_segments(r"so \(y = mx\) holds");
        assert_eq!(
            segs,
            vec![
                seg("so", SegmentKind::Text),
                seg("y = mx", SegmentKind::InlineMath),
                seg("holds", SegmentKind::Text),
            ]
        );
    }

    #[test]
    fn bold_text_is_typed() {
        let segs = parse_math_segments("this is **important** here");
        assert_eq!(
            segs,
            vec![
                seg("this is", SegmentKind::Text),
                seg("important", SegmentKind::BoldText),
                seg("here", SegmentKind::Text),
            ]
        );
    }

    #[test]
    fn lone_dollar_stays_plain_text() {
        let segs = parse_math_segments("costs $5 at most");
        assert_eq!(segs, vec![seg("costs $5 at most", SegmentKind::Text)]);
    }

    #[test]
    fn empty_math_region_is_dropped() {
        // `$$$$` has an empty interior after trimming; only the text remains.
        let segs = parse_math_segments("a $$ $$ b");
        assert_eq!(
            segs,
            vec![seg("a", SegmentKind::Text), seg("b", SegmentKind::Text)]
        );
    }

    #[test]
    fn adversarial_inputs_do_not_panic() {
        for input in [
            "$",
            "$$",
            "$$$",
            "$$$$$",
            "\\[",
            "\\(",
            "**",
            "***",
            "$a$$b$",
            "\\[$\\]",
            "$$\\(x\\)$$",
            "日本語 $数$ テスト",
        ] {
            let segs = parse_math_segments(input);
            assert!(!segs.is_empty(), "no segments for {input:?}");
        }
    }

    #[test]
    fn dollar_inside_bracket_block_resolved_by_leftmost_rule() {
        // A `$` inside `\[…\]`: the inline `$…$` pattern starts earlier only
        // if its opening `$` precedes the `\[`. Here `\[` comes first, so the
        // display block wins and swallows the dollar.
        let segs = parse_math_segments(r"\[ a $ b \]");
        assert_eq!(segs, vec![seg("a $ b", SegmentKind::DisplayMath)]);
    }

    #[test]
    fn group_rows_display_math_isolated() {
        let segs = parse_math_segments("intro $a$ then $$b$$ outro");
        let rows = group_rows(&segs);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 3); // intro, a, then
        assert_eq!(rows[1].len(), 1);
        assert_eq!(rows[1][0].kind, SegmentKind::DisplayMath);
        assert_eq!(rows[2].len(), 1); // outro
    }

    #[test]
    fn group_rows_preserves_order() {
        let segs = parse_math_segments("$$x$$$$y$$");
        let rows = group_rows(&segs);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].content, "x");
        assert_eq!(rows[1][0].content, "y");
    }
}
