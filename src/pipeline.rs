//! The end-to-end edit run: load, send, extract, save.

use crate::error::Result;
use crate::image::{Delivery, EditRequest, EditedImage, ImageEditor, ImageInput, DEFAULT_PROMPT};
use std::path::{Path, PathBuf};

/// Input file used when none is given.
pub const DEFAULT_INPUT: &str = "test_image.png";

/// Where the edited image is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Exactly this file.
    File(PathBuf),
    /// `edited_image.<ext>` inside this directory, `ext` from the returned MIME type.
    Directory(PathBuf),
}

impl OutputTarget {
    /// Default target for a delivery mode.
    ///
    /// Inline edits land next to the input; uploaded edits land in the
    /// working directory.
    pub fn default_for(delivery: Delivery, input: &Path) -> Self {
        match delivery {
            Delivery::Inline => {
                let dir = input
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                Self::Directory(dir.to_path_buf())
            }
            Delivery::Upload => Self::Directory(PathBuf::from(".")),
        }
    }

    fn resolve(&self, image: &EditedImage) -> PathBuf {
        match self {
            Self::File(path) => path.clone(),
            Self::Directory(dir) => image.default_path_in(dir),
        }
    }
}

/// One edit run: a single input file to at most one output file.
#[derive(Debug, Clone)]
pub struct EditJob {
    /// Image to edit.
    pub input: PathBuf,
    /// Edit instruction.
    pub prompt: String,
    /// How the image reaches the service.
    pub delivery: Delivery,
    /// Where the result goes.
    pub output: OutputTarget,
}

impl Default for EditJob {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT)
    }
}

impl EditJob {
    /// Creates an inline job with the default prompt and output location.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = OutputTarget::default_for(Delivery::Inline, &input);
        Self {
            input,
            prompt: DEFAULT_PROMPT.to_string(),
            delivery: Delivery::Inline,
            output,
        }
    }

    /// Sets the edit instruction.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Sets the delivery mode, resetting a default output location to match.
    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        if self.output == OutputTarget::default_for(self.delivery, &self.input) {
            self.output = OutputTarget::default_for(delivery, &self.input);
        }
        self.delivery = delivery;
        self
    }

    /// Sets where the result is written.
    pub fn with_output(mut self, output: OutputTarget) -> Self {
        self.output = output;
        self
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// File the edited image was written to.
    pub path: PathBuf,
    /// The edited image.
    pub image: EditedImage,
}

/// Runs `job` against `editor`.
///
/// Every step is sequential and any failure aborts the run. Nothing is
/// written unless the service returned an image.
pub async fn run(editor: &dyn ImageEditor, job: &EditJob) -> Result<EditOutcome> {
    let input = ImageInput::load(&job.input).await?;

    tracing::info!(
        editor = editor.name(),
        input = %job.input.display(),
        delivery = %job.delivery,
        "editing image"
    );

    let request = EditRequest::new(job.prompt.clone(), input).with_delivery(job.delivery);
    let image = editor.edit(&request).await?;

    let path = job.output.resolve(&image);
    image.save(&path).await?;
    tracing::info!(path = %path.display(), size = image.size(), "edited image saved");

    Ok(EditOutcome { path, image })
}
