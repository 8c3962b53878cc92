//! One run of the pipeline: config, mesh, view, then export or viewer

use crate::cli::Cli;
use crate::paths;
use anyhow::{bail, Context, Result};
use chrono::Local;
use meshshot_core::{load_config, Settings};
use meshshot_io::MeshLoader;
use meshshot_render::{configure, save_screenshot, Capabilities, RenderContext};
use meshshot_visualization::{ExportHandler, InteractiveViewer};
use std::path::{Path, PathBuf};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A static screenshot was written here
    Saved(PathBuf),
    /// The interactive viewer was closed
    ViewerClosed,
}

/// Run the pipeline for `cli`
pub fn run(cli: &Cli) -> Result<Outcome> {
    let settings = load_config(Some(&cli.config))
        .with_context(|| format!("Failed to read configuration {}", cli.config.display()))?;

    let mesh_path = match (&cli.mesh, &settings.mesh_path) {
        (Some(path), _) => path.clone(),
        (None, Some(path)) => settings.resolve_path(path),
        (None, None) => bail!("No mesh given: pass --mesh or set mesh_path in the configuration"),
    };

    let mesh = MeshLoader::new().load(&mesh_path)?;
    let ctx = configure(&settings.render, mesh, &Capabilities::software());

    if cli.interactive {
        run_interactive(&settings, &mesh_path, ctx)?;
        return Ok(Outcome::ViewerClosed);
    }

    let output = paths::static_output_path(&settings, cli.output.as_deref(), &mesh_path, &Local::now());
    save_screenshot(
        &ctx,
        &output,
        settings.render.image_scale,
        settings.render.transparent_background,
    )
    .with_context(|| format!("Failed to save screenshot of {}", mesh_path.display()))?;

    Ok(Outcome::Saved(output))
}

fn run_interactive(settings: &Settings, mesh_path: &Path, ctx: RenderContext) -> Result<()> {
    let scale = paths::export_scale(settings);
    let transparent = paths::export_transparency(settings);

    let on_export: ExportHandler<'_> = Box::new(move |view: &RenderContext| {
        let path = paths::interactive_export_path(settings, mesh_path, &Local::now());
        save_screenshot(view, &path, scale, transparent)?;
        Ok(path)
    });

    InteractiveViewer::new(ctx, paths::window_title(settings, mesh_path), on_export)
        .run()
        .context("Interactive viewer failed")
}
