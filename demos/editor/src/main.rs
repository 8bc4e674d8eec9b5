//! Editor Demo
//!
//! Assembles a toy editor from independent plugins.  `editor-view` is listed
//! first but still waits for `editor-state` and `node-view` through signals.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package editor-demo -- --content "# Title" --root "#app"
//! cargo run --package editor-demo -- --read-only
//! WEFT_PLUGINS__SLASH__ITEMS='[heading,quote]' cargo run --package editor-demo
//! ```

mod plugins;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use weft::prelude::*;

use crate::plugins::{EDITOR_OPTIONS, EDITOR_VIEW, EditorOptions, ROOT, preset, slash};

#[derive(Debug, Parser)]
#[command(version, about = "A toy editor assembled from Weft plugins")]
struct Args {
    /// Disable editing and the slash menu.
    #[arg(long)]
    read_only: bool,

    /// Initial document content.
    #[arg(long)]
    content: Option<String>,

    /// Mount point of the view.
    #[arg(long, default_value = "#editor")]
    root: String,

    /// Configuration file, instead of searching for `weft.toml`.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let config = loader.load()?;
    init_from_config(&config.logging);

    let mut orchestrator = Orchestrator::new()
        .with_config(&config)
        .use_plugins(preset());
    if !args.read_only {
        orchestrator = orchestrator.use_plugin(slash());
    }
    info!(plugins = ?orchestrator.plugin_names(), "Starting editor");

    let read_only = args.read_only;
    let content = args.content;
    let instance = orchestrator
        .bind(&ROOT, args.root)
        .config(move |ctx| {
            ctx.update(&EDITOR_OPTIONS, |options| EditorOptions {
                editable: !read_only,
                default_value: content.unwrap_or(options.default_value),
            })?;
            Ok(())
        })
        .run()
        .await?;

    if let Some(view) = instance.get(&EDITOR_VIEW)? {
        println!("{} ({})", view.root, if view.editable { "editable" } else { "read-only" });
        for line in &view.lines {
            println!("  │ {line}");
        }
        println!("cursor:     {}", view.cursor);
        println!("node views: {}", view.node_views.join(", "));
        if !view.widgets.is_empty() {
            println!("widgets:    {}", view.widgets.join(", "));
        }
    }

    instance.dispose().await;
    Ok(())
}
