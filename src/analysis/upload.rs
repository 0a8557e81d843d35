/// Preparation of a picked image for upload: MIME detection, file naming
/// and a header-only probe of the intrinsic pixel size.
use std::io::Cursor;
use std::path::Path;

use crate::errors::{ObscuraError, ObscuraResult};
use crate::overlay::types::Size;

/// Content types the analysis endpoint accepts.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Used when neither the bytes nor the file name reveal the type.
pub const FALLBACK_MIME: &str = "image/jpeg";

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub file_name: String,
    /// Intrinsic pixel size, `0×0` when the header could not be decoded.
    pub natural: Size,
}

impl ImageUpload {
    /// Build an upload from raw bytes. `mime_hint` is consulted only when the
    /// bytes themselves are not a recognised image format.
    pub fn from_bytes(bytes: Vec<u8>, mime_hint: Option<&str>) -> Self {
        let mime = mime_from_bytes(&bytes)
            .or(mime_hint)
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        let natural = match probe_dimensions(&bytes) {
            Ok(size) => size,
            Err(e) => {
                tracing::debug!(error = %e, "dimension probe failed; natural size unknown");
                Size::default()
            }
        };
        let file_name = format!("upload.{}", extension_for_mime(&mime));
        Self {
            bytes,
            mime,
            file_name,
            natural,
        }
    }

    pub async fn from_path(path: &Path) -> ObscuraResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        let upload = Self::from_bytes(bytes, mime_from_extension(path));
        tracing::info!(
            path = %path.display(),
            mime = %upload.mime,
            bytes = upload.bytes.len(),
            width = upload.natural.width,
            height = upload.natural.height,
            "image loaded"
        );
        Ok(upload)
    }

    pub fn validate(&self) -> ObscuraResult<()> {
        if self.bytes.is_empty() {
            return Err(ObscuraError::Upload("image is empty".into()));
        }
        if !ACCEPTED_MIME_TYPES.contains(&self.mime.as_str()) {
            return Err(ObscuraError::Upload(format!(
                "unsupported image type '{}'",
                self.mime
            )));
        }
        Ok(())
    }
}

/// File extension used for the multipart file name.
pub fn extension_for_mime(mime: &str) -> &'static str {
    if mime.contains("jpeg") || mime.contains("jpg") {
        "jpg"
    } else if mime.contains("png") {
        "png"
    } else if mime.contains("webp") {
        "webp"
    } else if mime.contains("heic") {
        "heic"
    } else {
        "bin"
    }
}

/// Sniff the MIME type from magic numbers.
pub fn mime_from_bytes(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" | "heif" => Some("image/heic"),
        _ => None,
    }
}

/// Read the intrinsic size from the image header without decoding pixels.
pub fn probe_dimensions(bytes: &[u8]) -> ObscuraResult<Size> {
    let (w, h) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(Size::new(w as f64, h as f64))
}
