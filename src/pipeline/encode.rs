//! Image encoding: photo file → downscaled base64 PNG wrapped in `ImageData`.
//!
//! Vision APIs (OpenAI, Anthropic, Gemini) accept images as base64 data-URIs
//! embedded in the JSON request body. Phone photos arrive at 4000×3000 and
//! beyond; the APIs tile images into 512 px blocks, so resolution past
//! ~2000 px costs tokens without helping the model read handwriting.
//! We downscale with Lanczos3 (sharp edges matter for pencil strokes) and
//! re-encode as PNG — lossless, so downscaling is the only quality loss.

use crate::error::MathSnapError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Load, downscale, and encode a photo ready for the vision API.
///
/// Neither output dimension exceeds `max_pixels`; smaller images pass
/// through unscaled. `detail: "high"` instructs GPT-4-class models to use
/// the full image tile budget; without it small superscripts and fraction
/// bars are lost.
pub fn encode_image(path: &Path, max_pixels: u32) -> Result<ImageData, MathSnapError> {
    let img = image::open(path).map_err(|e| MathSnapError::ImageDecodeFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let (w, h) = (img.width(), img.height());
    let img = if w > max_pixels || h > max_pixels {
        debug!("Downscaling {}×{} to fit {} px", w, h, max_pixels);
        img.resize(max_pixels, max_pixels, FilterType::Lanczos3)
    } else {
        img
    };

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| MathSnapError::ImageDecodeFailed {
            path: path.to_path_buf(),
            detail: format!("PNG re-encode failed: {}", e),
        })?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
