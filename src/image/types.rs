//! Core types for image editing: formats, the loaded input, the edited output.

use crate::error::{GenEditError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// MIME type assumed when neither the extension nor the content says otherwise.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// File stem used when the output name is derived from the returned MIME type.
pub const DEFAULT_OUTPUT_STEM: &str = "edited_image";

/// Image formats the editor recognises by extension, MIME type or magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
    /// HEIC (HEVC-coded HEIF).
    Heic,
    /// HEIF container.
    Heif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    ///
    /// The extension is the MIME subtype, so `image/jpeg` maps to `jpeg`.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Heic => "heic",
            Self::Heif => "heif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "heic" => Some(Self::Heic),
            "heif" => Some(Self::Heif),
            _ => None,
        }
    }

    /// Attempts to detect format from a MIME type such as `image/jpeg`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        match essence.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            "image/heic" => Some(Self::Heic),
            "image/heif" => Some(Self::Heif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        if data.len() < 12 {
            return None;
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        // ISO-BMFF: ....ftyp<brand>
        if &data[4..8] == b"ftyp" {
            return match &data[8..12] {
                b"heic" | b"heix" | b"hevc" | b"hevx" => Some(Self::Heic),
                b"mif1" | b"msf1" => Some(Self::Heif),
                _ => None,
            };
        }

        None
    }
}

/// An image loaded from disk, ready to be sent for editing.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Raw file contents.
    pub data: Vec<u8>,
    /// MIME type sent alongside the bytes.
    pub mime_type: String,
    /// File name shown to the service on upload.
    pub display_name: String,
}

impl ImageInput {
    /// Wraps in-memory bytes, inferring the MIME type from their content.
    pub fn from_bytes(data: Vec<u8>, display_name: impl Into<String>) -> Self {
        let mime_type = ImageFormat::from_magic_bytes(&data)
            .map(|f| f.mime_type())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        Self {
            data,
            mime_type,
            display_name: display_name.into(),
        }
    }

    /// Reads an image from `path`.
    ///
    /// The MIME type comes from the extension, then the magic bytes, then
    /// falls back to [`DEFAULT_MIME_TYPE`]. The content itself is not checked.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| GenEditError::read(path, e))?;

        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension)
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .map(|f| f.mime_type())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::debug!(
            path = %path.display(),
            mime_type = %mime_type,
            size = data.len(),
            "loaded input image"
        );

        Ok(Self {
            data,
            mime_type,
            display_name,
        })
    }

    /// Returns the size of the image in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Writes `data` to `path`, creating or truncating the file.
pub async fn save_image(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, data)
        .await
        .map_err(|source| GenEditError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Metadata about the edit request that produced an image.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditMetadata {
    /// Model that produced the image.
    pub model: Option<String>,
    /// Round-trip duration in milliseconds, upload included.
    pub duration_ms: Option<u64>,
    /// URI of the uploaded input, when the upload path was used.
    pub uploaded_file: Option<String>,
    /// Any text the model returned alongside the image.
    pub text: Option<String>,
}

/// An edited image returned by the service.
#[derive(Debug, Clone)]
#[must_use = "edited image should be saved or processed"]
pub struct EditedImage {
    /// Decoded image bytes.
    pub data: Vec<u8>,
    /// MIME type reported by the service.
    pub mime_type: String,
    /// Request metadata.
    pub metadata: EditMetadata,
}

impl EditedImage {
    /// Creates a new edited image.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, metadata: EditMetadata) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            metadata,
        }
    }

    /// Returns the format matching the reported MIME type, if known.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// File extension for the reported MIME type, `png` when unknown.
    pub fn extension(&self) -> &'static str {
        self.format().unwrap_or_default().extension()
    }

    /// Returns `edited_image.<ext>` for the reported MIME type.
    pub fn default_file_name(&self) -> String {
        format!("{DEFAULT_OUTPUT_STEM}.{}", self.extension())
    }

    /// Returns the default output path inside `dir`.
    pub fn default_path_in(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(self.default_file_name())
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_image(path, &self.data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";
    const HEIC_MAGIC: [u8; 12] = *b"\x00\x00\x00\x18ftypheic";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&HEIC_MAGIC),
            Some(ImageFormat::Heic)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic_bytes(b"hello"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(
            ImageFormat::from_mime_type("image/jpeg"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_mime_type("image/png; charset=binary"),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn test_default_file_name_follows_mime() {
        let jpeg = EditedImage::new(vec![1], "image/jpeg", EditMetadata::default());
        assert_eq!(jpeg.default_file_name(), "edited_image.jpeg");

        let webp = EditedImage::new(vec![1], "image/webp", EditMetadata::default());
        assert_eq!(webp.default_file_name(), "edited_image.webp");

        let unknown = EditedImage::new(vec![1], "application/octet-stream", EditMetadata::default());
        assert_eq!(unknown.default_file_name(), "edited_image.png");
    }

    #[test]
    fn test_metadata_serializes_for_reports() {
        let metadata = EditMetadata {
            model: Some("gemini-2.0-flash-exp".into()),
            duration_ms: Some(1200),
            uploaded_file: None,
            text: Some("Here is your ship.".into()),
        };
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            serde_json::json!({
                "model": "gemini-2.0-flash-exp",
                "duration_ms": 1200,
                "uploaded_file": null,
                "text": "Here is your ship."
            })
        );
    }

    #[tokio::test]
    async fn test_load_infers_mime_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpeg");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let input = ImageInput::load(&path).await.unwrap();
        assert_eq!(input.mime_type, "image/jpeg");
        assert_eq!(input.display_name, "photo.jpeg");
        assert_eq!(input.data, PNG_MAGIC);
    }

    #[tokio::test]
    async fn test_load_falls_back_to_magic_then_default() {
        let dir = tempfile::tempdir().unwrap();

        let sniffed = dir.path().join("noext");
        std::fs::write(&sniffed, WEBP_MAGIC).unwrap();
        let input = ImageInput::load(&sniffed).await.unwrap();
        assert_eq!(input.mime_type, "image/webp");

        let opaque = dir.path().join("blob.dat");
        std::fs::write(&opaque, b"not an image").unwrap();
        let input = ImageInput::load(&opaque).await.unwrap();
        assert_eq!(input.mime_type, DEFAULT_MIME_TYPE);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageInput::load(dir.path().join("missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenEditError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.png");
        let err = save_image(&path, b"data").await.unwrap_err();
        assert!(matches!(err, GenEditError::Write { .. }));
    }
}
