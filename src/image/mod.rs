//! Image editing module.

mod editor;
pub mod providers;
mod request;
mod types;

pub use editor::ImageEditor;
pub use request::{Delivery, EditRequest, DEFAULT_PROMPT};
pub use types::{
    save_image, EditMetadata, EditedImage, ImageFormat, ImageInput, DEFAULT_MIME_TYPE,
    DEFAULT_OUTPUT_STEM,
};
