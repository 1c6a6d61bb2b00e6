// SPDX-License-Identifier: MIT

//! Base64 data-URI decoding and the media file store.
//!
//! Image payloads arrive as `data:image/<subtype>;base64,<payload>` strings.
//! The payload must decode and the decoded bytes must carry a known raster
//! signature; the declared subtype is not trusted for the file extension.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// A decoded image payload, not yet written anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Image payload rejection; the display string is the API error message.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ImageError {
    #[error("Поле для картинки не может быть пустым.")]
    Blank,
    #[error("Неверный формат изображения.")]
    Invalid,
}

/// Parse and decode a base64 image data URI.
pub fn decode_data_uri(data: &str) -> Result<DecodedImage, ImageError> {
    if data.is_empty() {
        return Err(ImageError::Blank);
    }
    let rest = data.strip_prefix("data:image/").ok_or(ImageError::Invalid)?;
    let (subtype, payload) = rest.split_once(";base64,").ok_or(ImageError::Invalid)?;
    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ImageError::Invalid);
    }
    let bytes = STANDARD.decode(payload).map_err(|_| ImageError::Invalid)?;
    let extension = sniff_extension(&bytes).ok_or(ImageError::Invalid)?;
    Ok(DecodedImage { bytes, extension })
}

fn sniff_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else if bytes.starts_with(b"BM") {
        Some("bmp")
    } else {
        None
    }
}

/// Media file store rooted at the configured `MEDIA_ROOT`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write a decoded image under `subdir`, returning the media-relative
    /// path stored in the database.
    pub fn save(&self, subdir: &str, image: &DecodedImage) -> std::io::Result<String> {
        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), image.extension);
        let dir = self.root.join(subdir);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(&file_name), &image.bytes)?;
        Ok(format!("{subdir}/{file_name}"))
    }

    /// Remove a stored file. A file that is already gone is not an error;
    /// anything else is logged and swallowed, since removal runs as a
    /// post-delete hook after the owning row is gone.
    pub fn remove(&self, relative: &str) {
        let path = self.root.join(relative);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %err, "Failed to remove media file");
            }
        }
    }
}

/// Absolute URL for a media-relative path.
pub fn media_url(site_url: &str, relative: &str) -> String {
    format!("{site_url}/media/{relative}")
}
