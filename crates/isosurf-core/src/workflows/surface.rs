use crate::core::grid::ScalarGrid;
use crate::core::surface::{Isosurface, SurfaceResult};
use crate::engine::config::{ConfigError, SurfaceConfig, SurfacePhase};
use crate::engine::error::EngineError;
use crate::engine::marching_cubes::MarchingCubes;
use crate::engine::progress::{Progress, ProgressReporter};
use std::borrow::Cow;
use std::time::Instant;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOutcome {
    Completed(SurfaceResult),
    Cancelled,
}

impl SurfaceOutcome {
    pub fn completed(self) -> Option<SurfaceResult> {
        match self {
            SurfaceOutcome::Completed(result) => Some(result),
            SurfaceOutcome::Cancelled => None,
        }
    }
}

/// Extracts the isosurfaces of `grid` described by `config`.
///
/// `SurfacePhase::Auto` extracts both lobes when the grid holds signed data and only
/// the positive one otherwise. The negative lobe is extracted at `-isovalue`. A zero
/// isovalue names the single nodal surface, so `Auto` then extracts only that one.
#[instrument(skip_all, name = "surface_workflow")]
pub fn run(
    grid: &ScalarGrid,
    config: &SurfaceConfig,
    reporter: &ProgressReporter,
) -> Result<SurfaceOutcome, EngineError> {
    let start = Instant::now();
    let phase = resolve_phase(config.phase, grid, config.isovalue);
    validate(config, phase)?;

    let grid = if config.upsample {
        match super::grid::upsample(grid, reporter) {
            Some(fine) => Cow::Owned(fine),
            None => return Ok(cancelled()),
        }
    } else {
        Cow::Borrowed(grid)
    };

    let (positive, negative) = match phase {
        SurfacePhase::Positive => (true, false),
        SurfacePhase::Negative => (false, true),
        SurfacePhase::Both | SurfacePhase::Auto => (true, true),
    };
    info!(
        isovalue = config.isovalue,
        %phase,
        data_type = %grid.data_type(),
        size = %grid.size(),
        "Starting surface extraction."
    );

    if reporter.is_cancelled() {
        return Ok(cancelled());
    }

    let extractor = MarchingCubes::new(&grid);
    let passes = u64::from(positive) + u64::from(negative);

    reporter.report(Progress::PhaseStart {
        name: "Surface Extraction",
    });
    reporter.report(Progress::TaskStart {
        total_steps: extractor.slice_count() as u64 * passes,
    });

    let extract = |enabled: bool, isovalue: f64| -> Option<Isosurface> {
        enabled.then(|| {
            let child = ProgressReporter::with_callback(Box::new(|event| {
                if matches!(event, Progress::TaskIncrement) {
                    reporter.report(event);
                }
            }));
            extractor.generate_surface_with_progress(isovalue, &child)
        })
    };

    #[cfg(feature = "parallel")]
    let (positive, negative) = rayon::join(
        || extract(positive, config.isovalue),
        || extract(negative, -config.isovalue),
    );

    #[cfg(not(feature = "parallel"))]
    let (positive, negative) = (
        extract(positive, config.isovalue),
        extract(negative, -config.isovalue),
    );

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    if reporter.is_cancelled() {
        return Ok(cancelled());
    }

    let result = SurfaceResult { positive, negative };
    info!(
        triangles = result.triangle_count(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "Surface extraction finished."
    );
    Ok(SurfaceOutcome::Completed(result))
}

fn validate(config: &SurfaceConfig, phase: SurfacePhase) -> Result<(), ConfigError> {
    if !config.isovalue.is_finite() {
        return Err(ConfigError::InvalidIsovalue {
            value: config.isovalue,
            reason: "must be finite",
        });
    }
    if phase == SurfacePhase::Both && config.isovalue == 0.0 {
        return Err(ConfigError::InvalidIsovalue {
            value: config.isovalue,
            reason: "both phases need a non-zero isovalue",
        });
    }
    Ok(())
}

fn resolve_phase(phase: SurfacePhase, grid: &ScalarGrid, isovalue: f64) -> SurfacePhase {
    match phase {
        SurfacePhase::Auto if grid.data_type().is_signed() && isovalue != 0.0 => {
            SurfacePhase::Both
        }
        SurfacePhase::Auto => SurfacePhase::Positive,
        explicit => explicit,
    }
}

fn cancelled() -> SurfaceOutcome {
    warn!("Surface workflow cancelled.");
    SurfaceOutcome::Cancelled
}
