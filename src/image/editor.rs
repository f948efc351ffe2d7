//! Image editor trait.

use crate::error::Result;
use crate::image::types::EditedImage;
use crate::image::EditRequest;
use async_trait::async_trait;

/// A backend that applies a text instruction to an image.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Sends the request and returns the first image the backend produced.
    async fn edit(&self, request: &EditRequest) -> Result<EditedImage>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;
}
