//! What to edit and how the image travels to the service.

use crate::image::types::ImageInput;

/// Instruction used when none is given.
pub const DEFAULT_PROMPT: &str = "Add a pirate ship to this image";

/// How the input image reaches the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// Base64-encoded inside the generation request.
    #[default]
    Inline,
    /// Uploaded first; the request only references the stored file.
    Upload,
}

impl std::fmt::Display for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Upload => write!(f, "upload"),
        }
    }
}

/// A request to edit one image with one instruction.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// The text instruction describing the edit.
    pub prompt: String,
    /// The image to edit.
    pub input: ImageInput,
    /// How the image is sent.
    pub delivery: Delivery,
}

impl EditRequest {
    /// Creates an inline edit request.
    pub fn new(prompt: impl Into<String>, input: ImageInput) -> Self {
        Self {
            prompt: prompt.into(),
            input,
            delivery: Delivery::default(),
        }
    }

    /// Sets how the image is delivered.
    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Returns true if the image will be uploaded before generation.
    pub fn is_upload(&self) -> bool {
        self.delivery == Delivery::Upload
    }
}
