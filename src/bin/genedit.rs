//! CLI for GenEdit - edit an image with a Gemini model.

use clap::{Parser, ValueEnum};
use genedit::image::providers::gemini::DEFAULT_BASE_URL;
use genedit::pipeline::DEFAULT_INPUT;
use genedit::{Delivery, EditJob, GeminiEditor, GeminiModel, OutputTarget};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genedit")]
#[command(about = "Edit an image with a text instruction via Gemini")]
#[command(version)]
struct Cli {
    /// Image to edit
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Edit instruction
    #[arg(short, long, default_value = genedit::image::DEFAULT_PROMPT)]
    prompt: String,

    /// How the image is sent to the model
    #[arg(short, long, value_enum, default_value = "inline")]
    mode: ModeArg,

    /// Output file (default: edited_image.<ext>, next to the input for
    /// inline mode, in the working directory for upload mode)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model to use (default depends on --mode)
    #[arg(long, value_enum)]
    model: Option<ModelArg>,

    /// API endpoint
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Inline,
    Upload,
}

impl From<ModeArg> for Delivery {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Inline => Delivery::Inline,
            ModeArg::Upload => Delivery::Upload,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    #[value(name = "gemini-2.0-flash-exp")]
    FlashExp,
    #[value(name = "gemini-2.0-flash-exp-image-generation")]
    FlashExpImageGeneration,
    #[value(name = "gemini-2.5-flash-image")]
    FlashImage,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::FlashExp => GeminiModel::FlashExp,
            ModelArg::FlashExpImageGeneration => GeminiModel::FlashExpImageGeneration,
            ModelArg::FlashImage => GeminiModel::FlashImage,
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("genedit=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    edit(cli).await
}

async fn edit(cli: Cli) -> anyhow::Result<()> {
    // Credential check happens here, before any file or network access.
    let mut builder = GeminiEditor::builder().base_url(&cli.base_url);
    if let Some(model) = cli.model {
        builder = builder.model(model.into());
    }
    let editor = builder.build()?;

    let mut job = EditJob::new(&cli.input)
        .with_prompt(&cli.prompt)
        .with_delivery(cli.mode.into());
    if let Some(output) = cli.output {
        job = job.with_output(OutputTarget::File(output));
    }

    let outcome = genedit::run(&editor, &job).await?;
    let image = &outcome.image;

    if cli.json {
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "output": outcome.path.display().to_string(),
            "size_bytes": image.size(),
            "mime_type": image.mime_type,
            "metadata": image.metadata,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Edited image saved to: {}", outcome.path.display());
        if let Some(duration) = image.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}
