//! Thumbnail Module
//!
//! Best-effort preview generation for file drops. A provider either returns
//! a small inline preview or nothing; it can never fail an upload.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine as _;

/// Largest file we will attempt to decode for a preview.
const MAX_SOURCE_BYTES: u64 = 32 * 1024 * 1024;

/// Longest edge of the generated preview.
const THUMB_MAX_DIM: u32 = 160;

/// Pluggable preview generator.
///
/// Implementations must swallow their own failures; `None` simply means no
/// preview is attached to the announcement.
#[async_trait]
pub trait ThumbnailProvider: Send + Sync {
    async fn generate(&self, path: &Path, file_name: &str) -> Option<String>;
}

/// Image previews via the `image` crate, encoded as PNG data URLs.
#[derive(Default)]
pub struct ImageThumbnailer;

#[async_trait]
impl ThumbnailProvider for ImageThumbnailer {
    async fn generate(&self, path: &Path, file_name: &str) -> Option<String> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return None;
        }

        let meta = tokio::fs::metadata(path).await.ok()?;
        if meta.len() > MAX_SOURCE_BYTES {
            tracing::debug!(file_name = %file_name, size = meta.len(), "Skipping oversized thumbnail source");
            return None;
        }

        let bytes = tokio::fs::read(path).await.ok()?;
        let file_name = file_name.to_string();

        // Decoding and scaling are CPU-bound; keep them off the async workers.
        let result = tokio::task::spawn_blocking(move || encode_thumbnail(&bytes)).await;

        match result {
            Ok(Some(data_url)) => Some(data_url),
            Ok(None) => {
                tracing::debug!(file_name = %file_name, "Thumbnail generation failed");
                None
            }
            Err(e) => {
                tracing::debug!(file_name = %file_name, error = %e, "Thumbnail task panicked");
                None
            }
        }
    }
}

fn encode_thumbnail(bytes: &[u8]) -> Option<String> {
    let img = image::load_from_memory(bytes).ok()?;
    let thumb = img.thumbnail(THUMB_MAX_DIM, THUMB_MAX_DIM);

    let mut out = Vec::new();
    thumb
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .ok()?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&out);
    Some(format!("data:image/png;base64,{}", encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_non_image_yields_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc");
        tokio::fs::write(&path, b"not an image").await.unwrap();

        let thumb = ImageThumbnailer.generate(&path, "doc.txt").await;
        assert!(thumb.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_image_is_swallowed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken");
        tokio::fs::write(&path, b"\x89PNG\r\n\x1a\ngarbage").await.unwrap();

        let thumb = ImageThumbnailer.generate(&path, "broken.png").await;
        assert!(thumb.is_none());
    }

    #[tokio::test]
    async fn test_valid_image_produces_data_url() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pixel");

        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200u8, 30, 30]));
        img.save_with_format(&path, image::ImageFormat::Png).unwrap();

        let thumb = ImageThumbnailer.generate(&path, "pixel.png").await.unwrap();
        assert!(thumb.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_missing_file_yields_none() {
        let thumb = ImageThumbnailer
            .generate(Path::new("/nonexistent/file"), "ghost.png")
            .await;
        assert!(thumb.is_none());
    }
}
