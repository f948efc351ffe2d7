//! Upload edit - uploads the image through the Files API, references it in the
//! request and walks the response part by part.
//!
//! Run with: `cargo run --example upload_edit -- [input_image.png]`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use genedit::image::providers::gemini::wire::{GenerateContentRequest, ImageSource, Part};
use genedit::{Delivery, GeminiEditor, GenEditError, ImageInput};

#[tokio::main]
async fn main() -> genedit::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "test_image.png".to_string());

    let editor = GeminiEditor::builder().build()?;
    let input = ImageInput::load(&input_path).await?;

    let file = editor.upload_file(&input).await?;
    println!("Uploaded file {} as: {}", input.display_name, file.name);

    let request = GenerateContentRequest::build(
        ImageSource::uploaded(&file),
        "Add a pirate ship to this image",
        editor.generation_config_for(Delivery::Upload),
    );
    let response = editor
        .generate_content(editor.model_for(Delivery::Upload), &request)
        .await?;

    for part in response.parts() {
        match part {
            Part::FileData { file_data } => {
                println!("File response received: {}", file_data.file_uri);
            }
            Part::Text { text } => println!("{text}"),
            _ => {}
        }
    }

    match response.extract_image()? {
        Some(image) => {
            let ext = genedit::ImageFormat::from_mime_type(&image.mime_type)
                .unwrap_or_default()
                .extension();
            let filename = format!("edited_image.{ext}");
            genedit::image::save_image(&filename, &image.data).await?;
            println!("Edited image saved to: {filename}");
        }
        None => {
            return Err(GenEditError::NoImageReturned {
                file_references: response.file_references(),
            })
        }
    }

    Ok(())
}
