//! Files API upload.

use super::wire::{UploadFileResponse, UploadedFile};
use super::GeminiEditor;
use crate::error::{GenEditError, Result};
use crate::image::types::ImageInput;
use reqwest::multipart::{Form, Part};

impl GeminiEditor {
    /// Uploads `input` through the Files API and returns the stored file.
    ///
    /// The returned handle is referenced, not embedded, by later requests.
    /// Its lifetime is managed by the service.
    pub async fn upload_file(&self, input: &ImageInput) -> Result<UploadedFile> {
        let url = format!("{}?uploadType=multipart", self.endpoint("upload/v1beta/files"));

        let metadata = serde_json::json!({
            "file": { "displayName": input.display_name }
        });
        let metadata_part = Part::text(serde_json::to_string(&metadata)?)
            .mime_str("application/json")?;
        let file_part = Part::bytes(input.data.clone())
            .file_name(input.display_name.clone())
            .mime_str(&input.mime_type)
            .map_err(|e| {
                GenEditError::Config(format!("invalid MIME type '{}': {e}", input.mime_type))
            })?;
        let form = Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        tracing::debug!(
            display_name = %input.display_name,
            mime_type = %input.mime_type,
            size = input.size(),
            "uploading input image"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "multipart")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &text));
        }

        let body = response.text().await?;
        let uploaded: UploadFileResponse = serde_json::from_str(&body)?;
        let file = uploaded.file;

        tracing::info!(
            "uploaded file {} as: {}",
            file.display_name.as_deref().unwrap_or(&input.display_name),
            file.name
        );

        Ok(file)
    }
}
