#![warn(missing_docs)]
//! GenEdit - edit images with Gemini.
//!
//! Reads a local image, sends it with a text instruction to a Gemini model
//! and writes the image that comes back.
//!
//! # Quick Start
//!
//! ```no_run
//! use genedit::{EditJob, GeminiEditor};
//!
//! #[tokio::main]
//! async fn main() -> genedit::Result<()> {
//!     let editor = GeminiEditor::builder().build()?;
//!     let job = EditJob::new("test_image.png").with_prompt("Add a pirate ship to this image");
//!     let outcome = genedit::run(&editor, &job).await?;
//!     println!("saved {}", outcome.path.display());
//!     Ok(())
//! }
//! ```
//!
//! # Delivery
//!
//! - [`Delivery::Inline`]: the image is base64-encoded into the request.
//! - [`Delivery::Upload`]: the image goes through the Files API first and the
//!   request only references it.

mod error;
pub mod image;
pub mod pipeline;

// Re-export error types at crate root
pub use error::{GenEditError, Result};

pub use image::providers::{GeminiEditor, GeminiEditorBuilder, GeminiModel};
pub use image::{
    Delivery, EditMetadata, EditRequest, EditedImage, ImageEditor, ImageFormat, ImageInput,
};
pub use pipeline::{run, EditJob, EditOutcome, OutputTarget};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{GenEditError, Result};
    pub use crate::image::providers::GeminiEditor;
    pub use crate::image::{Delivery, EditRequest, EditedImage, ImageEditor, ImageInput};
    pub use crate::pipeline::{run, EditJob, OutputTarget};
}
