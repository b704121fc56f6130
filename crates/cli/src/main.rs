//! CLI tool that turns a PowerPoint deck into a narrated avatar video.

use anyhow::{bail, Context, Result};
use clap::Parser;
use deckcast_core::config::load_env_file;
use deckcast_core::normalize::title_from_filename;
use deckcast_core::{
    ConversionReport, NarrationScript, NarrationSource, Pipeline, PipelineOptions, ScriptBuilder,
    Settings,
};
use deckcast_heygen::HeygenClient;
use deckcast_openai::OpenAiScriptWriter;
use deckcast_pptx::PptxParser;
use deckcast_render::{probe_video, LibreOfficeRenderer};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Convert a PowerPoint deck into a narrated Heygen avatar video.
#[derive(Parser, Debug)]
#[command(name = "deckcast")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    #[arg(short, long)]
    input: PathBuf,

    /// Output video file (.mp4)
    #[arg(short, long)]
    output: PathBuf,

    /// Video title (default: derived from the input file name)
    #[arg(short, long)]
    title: Option<String>,

    /// Narrate at most this many slides
    #[arg(long)]
    max_slides: Option<usize>,

    /// Narration source: auto (notes, else slide text), notes, or text
    #[arg(long, default_value = "auto")]
    narration: NarrationSource,

    /// Drop slides without text instead of narrating a placeholder
    #[arg(long)]
    skip_empty: bool,

    /// Leave out slides marked hidden in the deck
    #[arg(long)]
    skip_hidden: bool,

    /// Rewrite slide text into spoken narration with OpenAI (needs OPENAI_API_KEY)
    #[arg(long)]
    rewrite: bool,

    /// Use a plain colour background instead of rendered slide images
    #[arg(long)]
    no_slide_images: bool,

    /// Load environment variables from this file instead of .env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Build the narration script, print it as JSON and stop
    #[arg(long)]
    dry_run: bool,

    /// Also write the final narration script as text to this file
    #[arg(long)]
    script_out: Option<PathBuf>,

    /// Check the downloaded video with ffprobe
    #[arg(long)]
    verify: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    load_env_file(args.env_file.as_deref()).context("Failed to load environment file")?;

    // Credentials are checked before any work that could reach the network.
    let settings = if args.dry_run {
        None
    } else {
        Some(Settings::from_env().context("Invalid configuration")?)
    };

    let script = build_script(&args)?;

    let Some(settings) = settings else {
        write_script_out(&args, &script)?;
        println!("{}", serde_json::to_string_pretty(&script)?);
        return Ok(());
    };

    let report = convert(&args, &settings, script).await?;

    if args.verify {
        let probe = probe_video(&args.output)
            .await
            .with_context(|| format!("Failed to probe {}", args.output.display()))?;
        if !probe.is_playable() {
            bail!(
                "{} is not a playable video ({:?})",
                args.output.display(),
                probe
            );
        }
        log::info!(
            "Verified {}: {:.1}s, {}x{}",
            args.output.display(),
            probe.duration_secs.unwrap_or_default(),
            probe.width.unwrap_or_default(),
            probe.height.unwrap_or_default()
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Parse the deck and turn it into a narration script.
fn build_script(args: &Args) -> Result<NarrationScript> {
    let presentation = PptxParser::new()
        .parse_path(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    log::info!(
        "Found {} slides ({} with text) in {}",
        presentation.slides.len(),
        presentation.text_bearing_slides(),
        presentation.filename
    );

    let title = args
        .title
        .clone()
        .unwrap_or_else(|| title_from_filename(&presentation.filename));

    let script = ScriptBuilder::new()
        .with_source(args.narration)
        .with_skip_empty(args.skip_empty)
        .with_skip_hidden(args.skip_hidden)
        .with_max_slides(args.max_slides)
        .build(&presentation, &title)
        .with_context(|| format!("Nothing to narrate in {}", args.input.display()))?;

    log::info!("Narration script has {} segments", script.len());
    Ok(script)
}

/// Write the narration script to `--script-out`, if given.
fn write_script_out(args: &Args, script: &NarrationScript) -> Result<()> {
    if let Some(path) = &args.script_out {
        write_output(path, &script.to_text())?;
        log::info!("Narration script written to {}", path.display());
    }
    Ok(())
}

/// Wire the service adapters into a pipeline and run it.
///
/// The script is rewritten first so `--script-out` holds the narration the
/// video is generated from.
async fn convert(
    args: &Args,
    settings: &Settings,
    script: NarrationScript,
) -> Result<ConversionReport> {
    let heygen = HeygenClient::new(settings.heygen.clone(), settings.retry)
        .context("Failed to create Heygen client")?;

    let writer = if args.rewrite {
        let openai = settings
            .require_openai()
            .context("--rewrite needs OpenAI credentials")?;
        Some(
            OpenAiScriptWriter::new(openai.clone(), settings.retry)
                .context("Failed to create OpenAI client")?,
        )
    } else {
        None
    };

    let renderer = if args.no_slide_images {
        None
    } else {
        Some(LibreOfficeRenderer::new(settings.video.dimension))
    };

    let mut pipeline = Pipeline::new(&heygen, PipelineOptions::from_settings(settings));
    if let Some(writer) = &writer {
        pipeline = pipeline.with_writer(writer);
    }
    if let Some(renderer) = &renderer {
        pipeline = pipeline.with_renderer(renderer);
    }

    if script.is_empty() {
        bail!("Nothing to narrate in {}", args.input.display());
    }
    let script = pipeline.rewrite(script).await;
    write_script_out(args, &script)?;

    pipeline
        .generate(&script, &args.input, &args.output)
        .await
        .with_context(|| format!("Failed to convert {}", args.input.display()))
}

/// Write output to a file, creating its directory if needed.
fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
