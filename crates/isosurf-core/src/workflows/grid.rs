use crate::core::grid::{DataType, GridSize, ScalarGrid};
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// Evaluates `field` at every point of a new grid.
///
/// Returns `None` if the reporter's cancellation check fires; the partial grid is
/// dropped.
#[instrument(skip_all, name = "grid_evaluation_workflow")]
pub fn evaluate<F>(
    data_type: DataType,
    size: GridSize,
    field: F,
    reporter: &ProgressReporter,
) -> Option<ScalarGrid>
where
    F: FnMut(f64, f64, f64) -> f64,
{
    reporter.report(Progress::PhaseStart {
        name: "Grid Evaluation",
    });
    info!(%data_type, %size, "Evaluating field on grid.");

    let mut grid = ScalarGrid::new(data_type, size);
    reporter.report(Progress::TaskStart {
        total_steps: size.dimensions()[0] as u64,
    });
    let outcome = grid.generate(
        field,
        |_| reporter.report(Progress::TaskIncrement),
        || reporter.is_cancelled(),
    );
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    outcome.is_completed().then_some(grid)
}

/// Builds a grid with half the step size of `grid`; `None` when cancelled.
#[instrument(skip_all, name = "upsample_workflow")]
pub fn upsample(grid: &ScalarGrid, reporter: &ProgressReporter) -> Option<ScalarGrid> {
    reporter.report(Progress::PhaseStart { name: "Upsampling" });
    reporter.report(Progress::TaskStart {
        total_steps: grid.size().dimensions()[0] as u64,
    });
    let fine = grid.upsample(
        |_| reporter.report(Progress::TaskIncrement),
        || reporter.is_cancelled(),
    );
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    if let Some(fine) = &fine {
        info!(from = %grid.size(), to = %fine.size(), "Grid upsampled.");
    }
    fine
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn size() -> GridSize {
        GridSize::new([-2; 3], [2; 3], 0.5).unwrap()
    }

    #[test]
    fn evaluate_fills_the_grid_and_reports_each_slice() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(event);
        }));

        let grid = evaluate(DataType::Promolecule, size(), |x, y, z| x + y + z, &reporter).unwrap();
        drop(reporter);

        assert_eq!(grid.value(2, 2, 2), 3.0);
        assert_eq!(grid.data_type(), DataType::Promolecule);
        let events = events.into_inner().unwrap();
        let increments = events
            .iter()
            .filter(|e| matches!(e, Progress::TaskIncrement))
            .count();
        assert_eq!(increments, 5);
        assert!(matches!(events.first(), Some(Progress::PhaseStart { name: "Grid Evaluation" })));
        assert!(matches!(events.last(), Some(Progress::PhaseFinish)));
    }

    #[test]
    fn evaluate_returns_none_when_cancelled() {
        let polls = AtomicUsize::new(0);
        let reporter = ProgressReporter::new()
            .with_cancellation(Box::new(|| polls.fetch_add(1, Ordering::Relaxed) >= 3));
        let calls = AtomicUsize::new(0);

        let grid = evaluate(
            DataType::TotalDensity,
            size(),
            |_, _, _| {
                calls.fetch_add(1, Ordering::Relaxed);
                1.0
            },
            &reporter,
        );
        assert!(grid.is_none());
        assert_eq!(calls.load(Ordering::Relaxed), 15);
    }

    #[test]
    fn upsample_workflow_halves_the_step() {
        let grid = evaluate(DataType::CubeData, size(), |x, _, _| x, &ProgressReporter::new()).unwrap();
        let fine = upsample(&grid, &ProgressReporter::new()).unwrap();
        assert_eq!(fine.step_size(), 0.25);
        assert_eq!(fine.size().dimensions(), [9, 9, 9]);
    }

    #[test]
    fn upsample_workflow_honours_cancellation() {
        let grid = ScalarGrid::new(DataType::CubeData, size());
        let reporter = ProgressReporter::new().with_cancellation(Box::new(|| true));
        assert!(upsample(&grid, &reporter).is_none());
    }
}
