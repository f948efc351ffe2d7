//! Image editing providers.

pub mod gemini;

pub use gemini::{GeminiEditor, GeminiEditorBuilder, GeminiModel};
