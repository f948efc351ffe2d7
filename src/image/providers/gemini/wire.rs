//! Gemini `generateContent` and Files API wire types.

use crate::error::{GenEditError, Result};
use crate::image::types::ImageInput;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Finish reasons that mean the output was withheld by a safety filter.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "IMAGE_RECITATION",
    "RECITATION",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
];

/// Output kinds the model may be asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Image output.
    Image,
    /// Text output.
    Text,
}

/// One content fragment, in a request or a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Base64 bytes carried in the message.
    InlineData {
        /// The encoded payload.
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: Blob,
    },
    /// Reference to a file stored by the service.
    FileData {
        /// The reference.
        #[serde(rename = "fileData", alias = "file_data")]
        file_data: FileData,
    },
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// Anything else the service sends; kept but never interpreted.
    Other(serde_json::Value),
}

impl Part {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Inline binary payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// MIME type of the decoded bytes.
    #[serde(alias = "mime_type")]
    pub mime_type: String,
    /// Standard base64 of the bytes.
    pub data: String,
}

/// Reference to a file held by the Files API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// MIME type of the stored file.
    #[serde(default, alias = "mime_type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// URI returned by the upload.
    #[serde(alias = "file_uri")]
    pub file_uri: String,
}

/// A turn in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// `user` for requests, `model` for responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Ordered parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Generation parameters passed through to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Output kinds requested.
    pub response_modalities: Vec<Modality>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Output token limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// Image output only, service defaults for everything else.
    pub fn image_only() -> Self {
        Self {
            response_modalities: vec![Modality::Image],
            temperature: None,
            top_p: None,
            top_k: None,
            max_output_tokens: None,
        }
    }

    /// Image and text output with explicit sampling parameters.
    pub fn image_and_text() -> Self {
        Self {
            response_modalities: vec![Modality::Image, Modality::Text],
            temperature: Some(1.0),
            top_p: Some(0.95),
            top_k: Some(40),
            max_output_tokens: Some(8192),
        }
    }
}

/// The image half of a request: embedded bytes or an upload reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Bytes embedded as base64.
    Inline {
        /// MIME type of the bytes.
        mime_type: String,
        /// Base64 of the bytes.
        data: String,
    },
    /// A file previously uploaded through the Files API.
    Uploaded {
        /// MIME type recorded at upload.
        mime_type: String,
        /// URI of the stored file.
        file_uri: String,
    },
}

impl ImageSource {
    /// Encodes the input for embedding.
    pub fn inline(input: &ImageInput) -> Self {
        Self::Inline {
            mime_type: input.mime_type.clone(),
            data: base64::engine::general_purpose::STANDARD.encode(&input.data),
        }
    }

    /// References an uploaded file.
    pub fn uploaded(file: &UploadedFile) -> Self {
        Self::Uploaded {
            mime_type: file.mime_type.clone(),
            file_uri: file.uri.clone(),
        }
    }

    fn into_part(self) -> Part {
        match self {
            Self::Inline { mime_type, data } => Part::InlineData {
                inline_data: Blob { mime_type, data },
            },
            Self::Uploaded {
                mime_type,
                file_uri,
            } => Part::FileData {
                file_data: FileData {
                    mime_type: Some(mime_type),
                    file_uri,
                },
            },
        }
    }
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// A single user turn.
    pub contents: Vec<Content>,
    /// Generation parameters.
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Builds a single-turn request: the image part, then the prompt.
    pub fn build(source: ImageSource, prompt: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![source.into_part(), Part::text(prompt)],
            }],
            generation_config: config,
        }
    }
}

/// Body returned by `generateContent`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Alternative results, in service order.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Set when the prompt itself was rejected.
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    /// Model version that served the request.
    #[serde(default)]
    pub model_version: Option<String>,
}

/// One alternative result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content; absent when generation stopped early.
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Prompt-level safety feedback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Why the prompt was blocked.
    #[serde(default)]
    pub block_reason: Option<String>,
    /// Human-readable explanation.
    #[serde(default)]
    pub block_reason_message: Option<String>,
}

/// A decoded inline image taken from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type reported by the service.
    pub mime_type: String,
    /// Decoded bytes.
    pub data: Vec<u8>,
}

impl GenerateContentResponse {
    /// All parts of all candidates, in service order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    /// Returns the first inline image across all candidates.
    ///
    /// File references met on the way are logged, never fetched.
    pub fn extract_image(&self) -> Result<Option<InlineImage>> {
        for part in self.parts() {
            match part {
                Part::InlineData { inline_data } if inline_data.mime_type.starts_with("image/") => {
                    let data = base64::engine::general_purpose::STANDARD
                        .decode(&inline_data.data)
                        .map_err(|e| GenEditError::Decode(e.to_string()))?;
                    return Ok(Some(InlineImage {
                        mime_type: inline_data.mime_type.clone(),
                        data,
                    }));
                }
                Part::InlineData { inline_data } => {
                    tracing::warn!(
                        mime_type = %inline_data.mime_type,
                        "skipping non-image inline data"
                    );
                }
                Part::FileData { file_data } => {
                    tracing::info!(uri = %file_data.file_uri, "file response received");
                }
                Part::Text { .. } | Part::Other(_) => {}
            }
        }
        Ok(None)
    }

    /// Concatenated text parts, if any.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .parts()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }

    /// URIs of all file references in the response.
    pub fn file_references(&self) -> Vec<String> {
        self.parts()
            .filter_map(|p| match p {
                Part::FileData { file_data } => Some(file_data.file_uri.clone()),
                _ => None,
            })
            .collect()
    }

    /// Describes why the service withheld output, if it did.
    pub fn block_reason(&self) -> Option<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
        {
            let message = self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason_message.clone())
                .unwrap_or_else(|| format!("prompt blocked: {reason}"));
            return Some(message);
        }

        self.candidates
            .iter()
            .filter_map(|c| c.finish_reason.as_deref())
            .find(|r| BLOCKING_FINISH_REASONS.contains(r))
            .map(|r| format!("output blocked by safety filter: {r}"))
    }
}

/// A file stored by the Files API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Resource name, e.g. `files/abc123`.
    pub name: String,
    /// URI to reference in generation requests.
    pub uri: String,
    /// MIME type recorded for the file.
    pub mime_type: String,
    /// Display name given at upload.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Processing state (`PROCESSING`, `ACTIVE`, `FAILED`).
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadFileResponse {
    pub(crate) file: UploadedFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn png_input() -> ImageInput {
        ImageInput::from_bytes(PNG_MAGIC.to_vec(), "test_image.png")
    }

    fn uploaded() -> UploadedFile {
        UploadedFile {
            name: "files/abc".into(),
            uri: "https://generativelanguage.googleapis.com/v1beta/files/abc".into(),
            mime_type: "image/png".into(),
            display_name: Some("test_image.png".into()),
            state: Some("ACTIVE".into()),
        }
    }

    #[test]
    fn test_inline_request_shape() {
        let req = GenerateContentRequest::build(
            ImageSource::inline(&png_input()),
            "Add a pirate ship",
            GenerationConfig::image_only(),
        );
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "iVBORw0KGgo=");
        assert!(parts[0].get("fileData").is_none());
        assert_eq!(parts[1]["text"], "Add a pirate ship");
        assert_eq!(
            json["generationConfig"],
            serde_json::json!({ "responseModalities": ["IMAGE"] })
        );
    }

    #[test]
    fn test_uploaded_request_shape() {
        let req = GenerateContentRequest::build(
            ImageSource::uploaded(&uploaded()),
            "Add a pirate ship",
            GenerationConfig::image_and_text(),
        );
        let json = serde_json::to_value(&req).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(
            parts[0]["fileData"]["fileUri"],
            "https://generativelanguage.googleapis.com/v1beta/files/abc"
        );
        assert!(parts[0].get("inlineData").is_none());
        assert_eq!(parts[1]["text"], "Add a pirate ship");

        let config = &json["generationConfig"];
        assert_eq!(config["responseModalities"], serde_json::json!(["IMAGE", "TEXT"]));
        assert_eq!(config["topK"], 40);
        assert_eq!(config["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_extract_first_image_across_candidates() {
        let json = r#"{
            "candidates": [
                { "content": { "parts": [{ "text": "Here you go" }] } },
                { "content": { "parts": [
                    { "inlineData": { "mimeType": "text/plain", "data": "aGk=" } },
                    { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } },
                    { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/" } }
                ] } }
            ]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();

        let image = resp.extract_image().unwrap().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, PNG_MAGIC);
        assert_eq!(resp.text().as_deref(), Some("Here you go"));
    }

    #[test]
    fn test_extract_none_without_candidates() {
        let resp: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(resp.extract_image().unwrap().is_none());
        assert!(resp.text().is_none());

        let resp: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.extract_image().unwrap().is_none());
    }

    #[test]
    fn test_file_reference_is_not_an_image() {
        let json = r#"{
            "candidates": [{ "content": { "role": "model", "parts": [
                { "fileData": { "mimeType": "image/png", "fileUri": "https://example.com/files/out" } }
            ] } }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();

        assert!(resp.extract_image().unwrap().is_none());
        assert_eq!(resp.file_references(), vec!["https://example.com/files/out"]);
    }

    #[test]
    fn test_malformed_base64_is_decode_error() {
        let json = r#"{
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "***" } }
            ] } }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(resp.extract_image(), Err(GenEditError::Decode(_))));
    }

    #[test]
    fn test_unknown_parts_are_tolerated() {
        let json = r#"{
            "candidates": [{ "content": { "parts": [
                { "executableCode": { "code": "print(1)" } }
            ] }, "finishReason": "STOP" }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let parts: Vec<_> = resp.parts().collect();
        assert!(matches!(parts[0], Part::Other(_)));
        assert!(resp.block_reason().is_none());
    }

    #[test]
    fn test_block_reason() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.block_reason().as_deref(),
            Some("Prompt was blocked due to safety")
        );

        let json = r#"{ "candidates": [{ "finishReason": "IMAGE_SAFETY" }] }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.block_reason().as_deref(),
            Some("output blocked by safety filter: IMAGE_SAFETY")
        );
    }

    #[test]
    fn test_upload_response_deserialization() {
        let json = r#"{
            "file": {
                "name": "files/abc",
                "displayName": "test_image.png",
                "mimeType": "image/png",
                "sizeBytes": "8",
                "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc",
                "state": "ACTIVE"
            }
        }"#;
        let resp: UploadFileResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.file, uploaded());
    }
}
