use super::read_cube;
use crate::cli::ExtractArgs;
use crate::config::PartialSurfaceConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use isosurf::{core::io::obj, workflows};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

pub async fn run(args: ExtractArgs, cancel: Arc<AtomicBool>) -> Result<()> {
    let partial_config = PartialSurfaceConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args)?;

    let (grid, _metadata) = read_cube(&args.input)?;

    let reporter = CliProgressHandler::new(cancel).reporter();

    println!(
        "Extracting {} isosurface(s) at isovalue {}...",
        final_config.phase, final_config.isovalue
    );
    info!("Invoking the core surface workflow...");

    let outcome = tokio::task::block_in_place(|| {
        workflows::surface::run(&grid, &final_config, &reporter)
    })?;
    let Some(result) = outcome.completed() else {
        return Err(CliError::Cancelled);
    };

    let surface_count = result.surfaces().count();
    if result.triangle_count() == 0 {
        warn!("Workflow completed but produced no triangles.");
        println!("Warning: no part of the grid crosses the requested isovalue.");
    }

    for (label, surface) in result.surfaces() {
        let output_path = generate_output_path(&args.output, label, surface_count);
        info!(
            "Writing {} surface ({} triangles) to {:?}",
            label,
            surface.triangle_count(),
            &output_path
        );
        obj::write_obj_to_path(surface, &output_path)?;
        println!(
            "✓ {} surface ({} triangles) written to: {}",
            label,
            surface.triangle_count(),
            output_path.display()
        );
    }

    Ok(())
}

fn generate_output_path(base: &Path, label: &str, total: usize) -> PathBuf {
    if total <= 1 {
        return base.to_path_buf();
    }
    let stem = base.file_stem().unwrap_or_default().to_string_lossy();
    let file_name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, label, ext.to_string_lossy()),
        None => format!("{}_{}", stem, label),
    };
    base.with_file_name(file_name)
}
