use std::num::NonZeroUsize;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use comicgen::cli::ServiceOptions;
use comicgen::config::{ComicConfig, setup_logging};
use comicgen::constants::{
    DEFAULT_LAYOUT_PRESET, DEFAULT_PAGE_FORMAT, DEFAULT_PANELS, DEFAULT_STYLE, MAX_PANELS,
};
use comicgen::layout::{LayoutPreset, PageFormat};
use comicgen::pipeline::{ComicPipeline, ComicRequest};
use tracing::warn;

/// Generate one comic page from the command line.
///
/// Minimal UX:
///   generate_comic "A cat learns to fly"
#[derive(Parser, Debug)]
#[command(name = "generate_comic")]
#[command(about = "Turn a story prompt into a comic page using the configured LLM and ComfyUI")]
struct Args {
    /// The story idea
    prompt: String,

    /// Art style (anime, manga, cartoon, realistic)
    #[arg(long, default_value = DEFAULT_STYLE)]
    style: String,

    /// Number of panels to write
    #[arg(long, default_value_t = DEFAULT_PANELS as u64,
          value_parser = clap::value_parser!(u64).range(1..=MAX_PANELS as u64))]
    panels: u64,

    /// Layout preset id, eg Layout0
    #[arg(long, default_value = DEFAULT_LAYOUT_PRESET)]
    layout: String,

    /// Page format, A4-P or A4-L
    #[arg(long, default_value = DEFAULT_PAGE_FORMAT)]
    page: String,

    /// Enable debug logging
    #[arg(long, env = "COMICGEN_DEBUG")]
    debug: bool,

    #[command(flatten)]
    services: ServiceOptions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug).map_err(|err| anyhow!("Failed to set up logging: {err}"))?;

    if LayoutPreset::find(&args.layout).is_none() {
        warn!(
            "Unknown layout {}, using {}",
            args.layout, DEFAULT_LAYOUT_PRESET
        );
    }
    let panel_count = usize::try_from(args.panels)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| anyhow!("Invalid panel count {}", args.panels))?;

    let config = ComicConfig::from(&args.services);
    config
        .ensure_dirs()
        .await
        .context("Failed to create output directories")?;

    let pipeline = ComicPipeline::new(&config);
    let comic_path = pipeline
        .create_comic(ComicRequest {
            prompt: args.prompt,
            style: args.style,
            panel_count,
            layout_preset: args.layout,
            page_format: PageFormat::from_id(&args.page),
            geometry: None,
        })
        .await
        .context("Comic generation failed")?;

    println!("{}", comic_path.display());
    Ok(())
}
