//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! ## Why download to a temp file?
//!
//! The encode stage re-reads the photo through the `image` crate, and a
//! `TempDir` gives us a path whose cleanup happens automatically when
//! `ResolvedInput` is dropped, even if the process panics. We validate the
//! image signature (PNG / JPEG / WebP) before returning so callers get a
//! meaningful error rather than a decode failure deep in the pipeline.

use crate::error::MathSnapError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input — either a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; image downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the image file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// True when the first bytes carry a supported image signature.
///
/// PNG: `\x89PNG`. JPEG: `\xFF\xD8\xFF`. WebP: RIFF container (`RIFF`).
fn has_image_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x89, b'P', b'N', b'G'])
        || bytes.starts_with(&[0xFF, 0xD8, 0xFF])
        || bytes.starts_with(b"RIFF")
}

/// Resolve the input string to a local image file path.
///
/// If the input is a URL, download it to a temporary directory.
/// If the input is a local file, validate it exists and is readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, MathSnapError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Resolve a local file path, validating existence and the image signature.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, MathSnapError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(MathSnapError::FileNotFound { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && !has_image_magic(&magic) {
                return Err(MathSnapError::NotAnImage { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(MathSnapError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(MathSnapError::FileNotFound { path });
        }
    }

    debug!("Resolved local image: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, MathSnapError> {
    info!("Downloading image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| MathSnapError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            MathSnapError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            MathSnapError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(MathSnapError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);

    let temp_dir = TempDir::new().map_err(|e| MathSnapError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MathSnapError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if bytes.len() >= 4 && !has_image_magic(&bytes) {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(MathSnapError::NotAnImage {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| MathSnapError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.png".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/photo.jpg"));
        assert!(is_url("http://example.com/photo.jpg"));
        assert!(!is_url("/tmp/photo.jpg"));
        assert!(!is_url("photo.jpg"));
        assert!(!is_url(""));
    }

    #[test]
    fn magic_accepts_png_jpeg_webp() {
        assert!(has_image_magic(&[0x89, b'P', b'N', b'G']));
        assert!(has_image_magic(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(has_image_magic(b"RIFF\x00\x00\x00\x00WEBP"));
        assert!(!has_image_magic(b"%PDF"));
        assert!(!has_image_magic(b"GIF8"));
    }

    #[test]
    fn resolve_local_missing_file() {
        let err = resolve_local("/definitely/not/here.png");
        assert!(matches!(err, Err(MathSnapError::FileNotFound { .. })));
    }

    #[test]
    fn resolve_local_rejects_non_image() {
        let mut f = tempfile::NamedTempFile::new().expect("tempfile");
        f.write_all(b"%PDF-1.7 not a photo").expect("write");
        let err = resolve_local(&f.path().to_string_lossy());
        assert!(matches!(err, Err(MathSnapError::NotAnImage { .. })));
    }

    #[test]
    fn resolve_local_accepts_png_signature() {
        let mut f = tempfile::NamedTempFile::new().expect("tempfile");
        f.write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
            .expect("write");
        let ok = resolve_local(&f.path().to_string_lossy());
        assert!(ok.is_ok());
    }

    #[test]
    fn extract_filename_from_url_path() {
        assert_eq!(
            extract_filename("https://example.com/shots/eq.jpg"),
            "eq.jpg"
        );
        assert_eq!(extract_filename("https://example.com/"), "downloaded.png");
    }
}
