//! Response parsing: turn a loosely-structured model response into typed
//! sections and renderable math segments.
//!
//! Two independent passes exist:
//!
//! 1. [`section`] — split the whole response into labelled solution sections
//!    (`PROBLEM:` / `Step N:` / `ANSWER:` / free text).
//! 2. [`segment`] — split any displayed string into LaTeX-delimited math
//!    segments (`$…$`, `$$…$$`, `\(…\)`, `\[…\]`) and bold/plain text, for
//!    mixed-mode rendering.
//!
//! Both passes are total functions: any input — empty, malformed,
//! adversarial — produces a valid, non-empty result. Unparseable fragments
//! degrade to plain text rather than failing, so callers never handle an
//! error or an empty list.
//!
//! Both are also pure and synchronous with no shared state, so they can be
//! re-run freely on every increment of a streaming response buffer.

pub mod section;
pub mod segment;

pub use section::{extract_problem, parse_solution, SolutionSection};
pub use segment::{group_rows, parse_math_segments, MathSegment, SegmentKind};
