//! Inline edit - embeds the image in the request and saves the result next to it.
//!
//! Run with: `cargo run --example inline_edit -- [input_image.png]`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use genedit::{EditJob, GeminiEditor};

#[tokio::main]
async fn main() -> genedit::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "test_image.png".to_string());

    let editor = GeminiEditor::builder().build()?;

    let job = EditJob::new(input_path).with_prompt("Add a pirate ship to this image");
    let outcome = genedit::run(&editor, &job).await?;

    println!(
        "Edited image saved to {} ({} bytes)",
        outcome.path.display(),
        outcome.image.size()
    );
    if let Some(text) = outcome.image.metadata.text {
        println!("{text}");
    }

    Ok(())
}
