//! Streaming parse API: re-parse the solution as response chunks arrive.
//!
//! ## Why stream?
//!
//! A vision model can take tens of seconds to finish a multi-step solution.
//! A streams-based API lets callers render the steps as they arrive instead
//! of staring at a spinner until the final token.
//!
//! Unlike the eager [`crate::solve::solve`] which parses once after the full
//! response lands, [`section_snapshots`] folds each incoming text chunk into
//! a buffer and yields a fresh parse of everything received so far. Because
//! the parser is prefix-stable — sections that ended before the current
//! chunk never change kind or content in later snapshots — a UI can diff
//! consecutive snapshots and only redraw the tail.

use crate::parse::{parse_solution, SolutionSection};
use futures::stream::StreamExt;
use std::pin::Pin;
use tokio_stream::Stream;

/// A boxed stream of section snapshots, one per input chunk.
pub type SectionStream = Pin<Box<dyn Stream<Item = Vec<SolutionSection>> + Send>>;

/// Fold a stream of response chunks into a stream of parsed snapshots.
///
/// Each yielded `Vec<SolutionSection>` is the parse of the full text
/// received so far, so the final snapshot equals the eager parse of the
/// complete response. Chunk boundaries may land anywhere, including inside
/// a header like `Step 3:` — the partial header simply parses as free text
/// until the rest of the line arrives.
pub fn section_snapshots<S>(chunks: S) -> SectionStream
where
    S: Stream<Item = String> + Send + 'static,
{
    let snapshots = chunks.scan(String::new(), |buffer, chunk| {
        buffer.push_str(&chunk);
        futures::future::ready(Some(parse_solution(buffer)))
    });
    Box::pin(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect(chunks: Vec<&'static str>) -> Vec<Vec<SolutionSection>> {
        let s = stream::iter(chunks.into_iter().map(str::to_string));
        section_snapshots(s).collect().await
    }

    #[tokio::test]
    async fn one_snapshot_per_chunk() {
        let snaps = collect(vec!["PROBLEM: x+1=2\n", "ANSWER: x=1\n"]).await;
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].len(), 1);
        assert_eq!(snaps[1].len(), 2);
    }

    #[tokio::test]
    async fn final_snapshot_matches_eager_parse() {
        let full = "PROBLEM: 2x = 6\nSOLUTION:\nStep 1: divide by 2\nANSWER: x = 3\n";
        // Split at awkward places, including mid-header.
        let snaps = collect(vec![
            "PROBLEM: 2x = 6\nSOLUT",
            "ION:\nStep 1: div",
            "ide by 2\nANSW",
            "ER: x = 3\n",
        ])
        .await;
        let last = snaps.last().cloned().unwrap_or_default();
        assert_eq!(last, parse_solution(full));
    }

    #[tokio::test]
    async fn settled_sections_never_change() {
        let full = "PROBLEM: p\nStep 1: a\nStep 2: b\nANSWER: done\n";
        let chunks: Vec<String> = full
            .as_bytes()
            .chunks(5)
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
            .collect();
        let s = stream::iter(chunks.into_iter());
        let snaps: Vec<_> = section_snapshots(s).collect().await;

        for pair in snaps.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.is_empty() {
                continue;
            }
            // All but the still-open last section must carry over verbatim.
            let settled = prev.len() - 1;
            assert_eq!(&prev[..settled], &next[..settled]);
        }
    }

    #[tokio::test]
    async fn empty_input_stream_yields_nothing() {
        let snaps = collect(vec![]).await;
        assert!(snaps.is_empty());
    }
}
