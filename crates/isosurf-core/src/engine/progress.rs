#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Polled between units of work; returning `true` asks the running task to stop.
pub type CancellationCheck<'a> = Box<dyn Fn() -> bool + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
    cancellation: Option<CancellationCheck<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, check: CancellationCheck<'a>) -> Self {
        self.cancellation = Some(check);
        self
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(|check| check())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn reporter_without_callbacks_is_silent_and_never_cancelled() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::TaskIncrement);
        assert!(!reporter.is_cancelled());
    }

    #[test]
    fn reporter_forwards_events_and_polls_cancellation() {
        let events = Mutex::new(Vec::new());
        let stop = AtomicBool::new(false);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(format!("{event:?}"));
        }))
        .with_cancellation(Box::new(|| stop.load(Ordering::Relaxed)));

        reporter.report(Progress::PhaseStart { name: "Test" });
        reporter.report(Progress::PhaseFinish);
        assert!(!reporter.is_cancelled());
        stop.store(true, Ordering::Relaxed);
        assert!(reporter.is_cancelled());
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert_eq!(events, vec!["PhaseStart { name: \"Test\" }", "PhaseFinish"]);
    }
}
