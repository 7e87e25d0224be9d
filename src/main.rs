//! Headless plot inspector: loads a plot document, rebuilds it through the
//! editor registries and logs an inventory.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lightplot::{
    init_logging, memory_scene, Editor, EditorConfig, ElementRef, LockState, PlotDocument,
    BUILD_DATE, VERSION,
};

/// Command-line arguments for the LightPlot inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Plot document to load (JSON)
    plot: PathBuf,

    /// Editor configuration file (TOML or JSON); defaults to the platform config location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the rebuilt plot back out to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn describe(element: &ElementRef) {
    let position = element.position();
    let channel = element
        .prop("channel")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    tracing::info!(
        id = element.id(),
        element_type = element.element_type(),
        x = position.x,
        y = position.y,
        rotation = element.rotation(),
        locked = element.is_locked(),
        channel = %channel,
        "element"
    );
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = Args::parse();
    tracing::info!(version = VERSION, built = BUILD_DATE, "LightPlot");

    let config = EditorConfig::load_or_default(args.config.as_deref());
    let document = PlotDocument::load_from_file(&args.plot)?;

    let editor = Editor::new(config, memory_scene());
    let loaded = editor
        .load_document(&document)
        .with_context(|| format!("Failed to rebuild plot {}", args.plot.display()))?;

    tracing::info!(
        title = %document.metadata.title,
        venue = %document.metadata.venue,
        elements = loaded,
        skipped = document.elements.len() - loaded,
        "plot rebuilt"
    );
    for element in editor.elements().get_all() {
        describe(&element);
    }

    if let Some(output) = &args.output {
        let mut rebuilt = editor.document(document.metadata.clone());
        rebuilt.touch();
        rebuilt.save_to_file(output)?;
        tracing::info!(path = %output.display(), "plot written");
    }

    Ok(())
}
