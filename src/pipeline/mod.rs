//! Pipeline stages for photo-to-solution requests.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ llm ──▶ clean ──▶ parse
//! (URL/path) (base64)  (VLM)  (cleanup)  (sections/segments)
//! ```
//!
//! 1. [`input`]  — canonicalise the user-supplied path or URL to a local
//!    image file, validating the format signature
//! 2. [`encode`] — decode, downscale, PNG-encode and base64-wrap the photo
//!    for the multimodal API request body
//! 3. [`llm`]    — drive the vision call with retry/backoff; the only stage
//!    with network I/O
//! 4. [`clean`]  — deterministic text-cleanup rules to fix model quirks
//!    (markdown fences, CRLF, invisible Unicode) before parsing

pub mod clean;
pub mod encode;
pub mod input;
pub mod llm;
