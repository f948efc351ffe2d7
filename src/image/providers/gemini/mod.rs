//! Gemini (Google) image editing provider.

mod files;
pub mod wire;

use crate::error::{sanitize_error_message, GenEditError, Result};
use crate::image::editor::ImageEditor;
use crate::image::request::{Delivery, EditRequest};
use crate::image::types::{EditMetadata, EditedImage};
use async_trait::async_trait;
use std::time::Instant;
use wire::{GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImageSource};

/// Public Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variable the API key is read from by default.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Gemini model variants able to return images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.0 Flash experimental.
    FlashExp,
    /// Gemini 2.0 Flash experimental, image generation build.
    FlashExpImageGeneration,
    /// Gemini 2.5 Flash Image.
    FlashImage,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashExp => "gemini-2.0-flash-exp",
            Self::FlashExpImageGeneration => "gemini-2.0-flash-exp-image-generation",
            Self::FlashImage => "gemini-2.5-flash-image",
        }
    }

    /// Model used for a delivery mode when none is configured.
    pub fn default_for(delivery: Delivery) -> Self {
        match delivery {
            Delivery::Inline => Self::FlashExp,
            Delivery::Upload => Self::FlashExpImageGeneration,
        }
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for [`GeminiEditor`].
#[derive(Debug, Clone)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    api_key_env: String,
    model: Option<GeminiModel>,
    base_url: String,
    generation_config: Option<GenerationConfig>,
}

impl Default for GeminiEditorBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: API_KEY_ENV.to_string(),
            model: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            generation_config: None,
        }
    }
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to the `api_key_env` variable.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the environment variable consulted when no key is given.
    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = var.into();
        self
    }

    /// Pins the model instead of choosing one per delivery mode.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Overrides the API endpoint (useful for proxies and tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Overrides the generation parameters for every delivery mode.
    pub fn generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    /// Builds the editor, resolving the API key.
    ///
    /// Fails before any network activity when no key is available.
    pub fn build(self) -> Result<GeminiEditor> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                GenEditError::Config(format!(
                    "{} not set and no API key provided",
                    self.api_key_env
                ))
            })?;

        Ok(GeminiEditor {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            generation_config: self.generation_config,
        })
    }
}

/// Gemini image editor.
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: String,
    model: Option<GeminiModel>,
    base_url: String,
    generation_config: Option<GenerationConfig>,
}

impl GeminiEditor {
    /// Creates a new `GeminiEditorBuilder`.
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Model that serves requests sent with `delivery`.
    pub fn model_for(&self, delivery: Delivery) -> GeminiModel {
        self.model
            .unwrap_or_else(|| GeminiModel::default_for(delivery))
    }

    /// Generation parameters for requests sent with `delivery`.
    pub fn generation_config_for(&self, delivery: Delivery) -> GenerationConfig {
        if let Some(ref config) = self.generation_config {
            return config.clone();
        }
        match delivery {
            Delivery::Inline => GenerationConfig::image_only(),
            Delivery::Upload => GenerationConfig::image_and_text(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Sends one `generateContent` call and returns the parsed response.
    pub async fn generate_content(
        &self,
        model: GeminiModel,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(&format!("v1beta/models/{}:generateContent", model.as_str()));

        tracing::debug!(model = %model, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &text));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn edit_impl(&self, request: &EditRequest) -> Result<EditedImage> {
        let start = Instant::now();
        let model = self.model_for(request.delivery);

        let (source, uploaded_file) = match request.delivery {
            Delivery::Inline => (ImageSource::inline(&request.input), None),
            Delivery::Upload => {
                let file = self.upload_file(&request.input).await?;
                (ImageSource::uploaded(&file), Some(file.uri))
            }
        };

        let body = GenerateContentRequest::build(
            source,
            request.prompt.clone(),
            self.generation_config_for(request.delivery),
        );
        let response = self.generate_content(model, &body).await?;

        let text = response.text();
        if let Some(ref text) = text {
            tracing::info!("model text: {text}");
        }

        let Some(image) = response.extract_image()? else {
            if let Some(reason) = response.block_reason() {
                return Err(GenEditError::ContentBlocked(reason));
            }
            return Err(GenEditError::NoImageReturned {
                file_references: response.file_references(),
            });
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            mime_type = %image.mime_type,
            size = image.data.len(),
            duration_ms,
            "received edited image"
        );

        Ok(EditedImage::new(
            image.data,
            image.mime_type,
            EditMetadata {
                model: Some(model.as_str().to_string()),
                duration_ms: Some(duration_ms),
                uploaded_file,
                text,
            },
        ))
    }

    fn parse_error(status: u16, text: &str) -> GenEditError {
        let text = sanitize_error_message(text);
        if status == 401 || status == 403 {
            return GenEditError::Auth(text);
        }
        // An invalid key comes back as 400 with API_KEY_INVALID.
        if status == 400 && text.contains("API_KEY_INVALID") {
            return GenEditError::Auth(text);
        }
        if status == 404 {
            return GenEditError::Api {
                status,
                message: format!("model or file not found: {text}"),
            };
        }
        GenEditError::Api {
            status,
            message: text,
        }
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn edit(&self, request: &EditRequest) -> Result<EditedImage> {
        self.edit_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::FlashExp.as_str(), "gemini-2.0-flash-exp");
        assert_eq!(
            GeminiModel::FlashExpImageGeneration.as_str(),
            "gemini-2.0-flash-exp-image-generation"
        );
        assert_eq!(GeminiModel::FlashImage.to_string(), "gemini-2.5-flash-image");
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let editor = GeminiEditorBuilder::new()
            .api_key("test-key")
            .base_url("http://localhost:1234/")
            .build()
            .unwrap();
        assert_eq!(editor.base_url, "http://localhost:1234");
        assert_eq!(
            editor.endpoint("upload/v1beta/files"),
            "http://localhost:1234/upload/v1beta/files"
        );
    }

    #[test]
    fn test_builder_without_key_is_config_error() {
        let result = GeminiEditor::builder()
            .api_key_env("GENEDIT_TEST_KEY_THAT_IS_NEVER_SET")
            .build();
        match result {
            Err(GenEditError::Config(msg)) => {
                assert!(msg.contains("GENEDIT_TEST_KEY_THAT_IS_NEVER_SET"))
            }
            _ => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn test_blank_key_is_rejected() {
        let result = GeminiEditor::builder()
            .api_key("   ")
            .api_key_env("GENEDIT_TEST_KEY_THAT_IS_NEVER_SET")
            .build();
        assert!(matches!(result, Err(GenEditError::Config(_))));
    }

    #[test]
    fn test_model_and_config_follow_delivery() {
        let editor = GeminiEditor::builder().api_key("k").build().unwrap();
        assert_eq!(editor.model_for(Delivery::Inline), GeminiModel::FlashExp);
        assert_eq!(
            editor.model_for(Delivery::Upload),
            GeminiModel::FlashExpImageGeneration
        );
        assert_eq!(
            editor.generation_config_for(Delivery::Inline),
            GenerationConfig::image_only()
        );
        assert_eq!(
            editor.generation_config_for(Delivery::Upload),
            GenerationConfig::image_and_text()
        );

        let pinned = GeminiEditor::builder()
            .api_key("k")
            .model(GeminiModel::FlashImage)
            .generation_config(GenerationConfig::image_only())
            .build()
            .unwrap();
        assert_eq!(pinned.model_for(Delivery::Upload), GeminiModel::FlashImage);
        assert_eq!(
            pinned.generation_config_for(Delivery::Upload),
            GenerationConfig::image_only()
        );
    }

    #[test]
    fn test_parse_error_mapping() {
        assert!(matches!(
            GeminiEditor::parse_error(401, "unauthorized"),
            GenEditError::Auth(_)
        ));
        assert!(matches!(
            GeminiEditor::parse_error(400, r#"{"error":{"reason":"API_KEY_INVALID"}}"#),
            GenEditError::Auth(_)
        ));
        match GeminiEditor::parse_error(500, "boom") {
            GenEditError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
