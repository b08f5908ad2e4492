//! Coarse download progress reporting
//!
//! Fractional progress from the downloader is rounded to a percentage and
//! bucketed into ten steps. Only bucket changes reach the observer, so a
//! download produces at most eleven status lines no matter how chatty the
//! source is.

use std::sync::{Arc, Mutex};
use tracing::info;

/// Number of cells in the rendered bar
const BAR_WIDTH: u8 = 10;
const FILLED: char = '=';
const EMPTY: char = '.';

/// Receives the rendered bar whenever the progress bucket changes
pub trait ProgressObserver: Send + Sync {
    fn on_bucket_change(&self, bar: &str);
}

/// Logs each bar at info level
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_bucket_change(&self, bar: &str) {
        info!("Download status: [{}]", bar);
    }
}

/// Last emission, used for de-duplication
#[derive(Debug, Default)]
struct ProgressState {
    bucket: Option<u8>,
    last_emitted: Option<String>,
}

/// Converts fractional progress into de-duplicated bar strings
pub struct ProgressReporter {
    observer: Arc<dyn ProgressObserver>,
    state: Mutex<ProgressState>,
}

impl ProgressReporter {
    pub fn new(observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            observer,
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Forget the previous emission so the next report always emits
    pub fn reset(&self) {
        *self.lock() = ProgressState::default();
    }

    /// Report completion in `[0.0, 1.0]`; out-of-range values are clamped
    pub fn report(&self, fraction: f64) {
        let bucket = bucket_for(fraction);

        // Compare and emit under one lock so concurrent reporters cannot
        // interleave their output
        let mut state = self.lock();
        let bar = render_bar(bucket);
        if state.bucket == Some(bucket) || state.last_emitted.as_deref() == Some(bar.as_str()) {
            return;
        }
        self.observer.on_bucket_change(&bar);
        state.bucket = Some(bucket);
        state.last_emitted = Some(bar);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Round to a whole percentage, then drop to one of 0..=10 tiers
fn bucket_for(fraction: f64) -> u8 {
    let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    let percent = (fraction * 100.0).round() as u8;
    percent / 10
}

fn render_bar(bucket: u8) -> String {
    (1..=BAR_WIDTH)
        .map(|cell| if cell <= bucket { FILLED } else { EMPTY })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ProgressObserver for Recorder {
        fn on_bucket_change(&self, bar: &str) {
            self.0.lock().unwrap().push(bar.to_string());
        }
    }

    fn reporter() -> (Arc<Recorder>, ProgressReporter) {
        let recorder = Arc::new(Recorder::default());
        let reporter = ProgressReporter::new(recorder.clone());
        (recorder, reporter)
    }

    #[test]
    fn test_bucket_rounding() {
        assert_eq!(bucket_for(0.0), 0);
        assert_eq!(bucket_for(0.05), 0);
        assert_eq!(bucket_for(0.099), 1);
        assert_eq!(bucket_for(0.11), 1);
        assert_eq!(bucket_for(0.27), 2);
        assert_eq!(bucket_for(1.0), 10);
        assert_eq!(bucket_for(1.7), 10);
        assert_eq!(bucket_for(-0.3), 0);
        assert_eq!(bucket_for(f64::NAN), 0);
    }

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(0), "..........");
        assert_eq!(render_bar(3), "===.......");
        assert_eq!(render_bar(10), "==========");
    }

    #[test]
    fn test_duplicates_suppressed() {
        let (recorder, reporter) = reporter();
        for fraction in [0.00, 0.05, 0.11, 0.11, 0.27] {
            reporter.report(fraction);
        }

        let emitted = recorder.0.lock().unwrap();
        assert_eq!(
            *emitted,
            vec!["..........", "=.........", "==........"]
        );
    }

    #[test]
    fn test_reset_emits_again() {
        let (recorder, reporter) = reporter();
        reporter.report(1.0);
        reporter.report(1.0);
        reporter.reset();
        reporter.report(0.0);
        reporter.report(1.0);

        assert_eq!(recorder.0.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_concurrent_reports_emit_each_bucket_once() {
        let (recorder, reporter) = reporter();
        let reporter = Arc::new(reporter);

        // One thread per bucket, each reporting its own bucket once
        let handles: Vec<_> = (0..=10)
            .map(|bucket| {
                let reporter = reporter.clone();
                std::thread::spawn(move || reporter.report(f64::from(bucket) / 10.0))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let emitted = recorder.0.lock().unwrap();
        assert_eq!(emitted.len(), 11);
        for bucket in 0..=10 {
            let bar = render_bar(bucket);
            assert_eq!(emitted.iter().filter(|b| **b == bar).count(), 1, "{}", bar);
        }
    }

    #[test]
    fn test_concurrent_same_bucket_emits_once() {
        let (recorder, reporter) = reporter();
        let reporter = Arc::new(reporter);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reporter = reporter.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        reporter.report(0.42);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*recorder.0.lock().unwrap(), vec!["====......"]);
    }
}
