use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use isosurf::engine::progress::{Progress, ProgressReporter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;

struct BarState {
    bar: ProgressBar,
    phase: &'static str,
}

/// Draws workflow progress on the terminal and feeds the Ctrl-C flag back to the
/// workflow as its cancellation check.
///
/// One bar is reused for every phase. Slice counts of the two surface passes land on
/// the same bar, possibly from different rayon threads.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
    cancel: Arc<AtomicBool>,
}

impl CliProgressHandler {
    pub fn new(cancel: Arc<AtomicBool>) -> Self {
        Self::with_draw_target(cancel, ProgressDrawTarget::stderr())
    }

    fn with_draw_target(cancel: Arc<AtomicBool>, target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target).with_style(spinner_style());
        Self {
            state: Arc::new(Mutex::new(BarState { bar, phase: "" })),
            cancel,
        }
    }

    /// A reporter that draws on this handler's bar and stops once Ctrl-C was pressed.
    pub fn reporter(&self) -> ProgressReporter<'static> {
        let handler = self.clone();
        let cancel = self.cancel.clone();
        ProgressReporter::with_callback(Box::new(move |event| handler.handle(event)))
            .with_cancellation(Box::new(move || cancel.load(Ordering::Relaxed)))
    }

    fn handle(&self, event: Progress) {
        let Ok(mut state) = self.state.lock() else {
            warn!("Progress bar state was poisoned; dropping progress event.");
            return;
        };
        let cancelled = self.cancel.load(Ordering::Relaxed);

        match event {
            Progress::PhaseStart { name } => {
                state.phase = name;
                state.bar.reset();
                state.bar.set_length(0);
                state.bar.set_style(spinner_style());
                state.bar.set_message(name);
                state.bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::TaskStart { total_steps } => {
                state.bar.disable_steady_tick();
                state.bar.set_style(bar_style());
                state.bar.set_length(total_steps);
                state.bar.set_position(0);
            }
            Progress::TaskIncrement => state.bar.inc(1),
            Progress::TaskFinish if !cancelled => {
                if let Some(length) = state.bar.length() {
                    state.bar.set_position(length);
                }
            }
            Progress::TaskFinish => {}
            Progress::PhaseFinish => {
                state.bar.disable_steady_tick();
                let phase = state.phase;
                if cancelled {
                    state.bar.abandon_with_message(format!("✗ {} cancelled", phase));
                } else {
                    state.bar.finish_with_message(format!("✓ {}", phase));
                }
            }
            Progress::Message(msg) => state.bar.println(format!("  {}", msg)),
        }
    }

    #[cfg(test)]
    fn snapshot(&self) -> (String, u64, Option<u64>) {
        let state = self.state.lock().unwrap();
        (state.bar.message(), state.bar.position(), state.bar.length())
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<20} {wide_bar:.cyan/blue} {pos}/{len} slices [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}
