//! Screen auto-rotation from accelerometer tilt.
//!
//! Wires the sampling producer to the debounce consumer with pluggable
//! components:
//! - **Classifier**: maps a tilt sample to an orientation candidate
//! - **DebounceState**: commits a candidate after sustained agreement
//! - **OrientationApplier**: pushes a committed orientation to X11

mod applier;
mod config;
mod metrics;
mod orientation;
mod state;

pub use applier::{detect_touchscreens, OrientationApplier, XApplier};
pub use config::AutorotateConfig;
pub use metrics::WatchMetrics;
pub use orientation::{classify, Axis, Edge, Orientation};
pub use state::DebounceState;

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

use crate::accelerometer::{Reader, Sample};
use crate::prelude::Result;

/// Interval between metrics summaries in the watch loop.
const METRICS_SUMMARY_INTERVAL: Duration = Duration::from_secs(60);

/// Screen auto-rotation orchestrator.
///
/// Owns the debounce state and drives the producer/consumer pair: a sampler
/// task polls the accelerometer while this task consumes samples strictly
/// in order and applies committed orientation changes.
pub struct Autorotate<A: OrientationApplier> {
    config: AutorotateConfig,
    applier: A,
    state: DebounceState,
    metrics: WatchMetrics,
}

impl<A: OrientationApplier> Autorotate<A> {
    /// Validate the configuration and build a watcher around an applier.
    pub fn new(config: AutorotateConfig, applier: A) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            applier,
            state: DebounceState::new(),
            metrics: WatchMetrics::new(),
        })
    }

    /// The last committed orientation.
    pub fn orientation(&self) -> Orientation {
        self.state.current()
    }

    /// Run the watch loop until SIGINT arrives or sampling ends.
    ///
    /// An irrecoverable read failure in the sampler closes the channel and
    /// ends the watch cleanly with `Ok(())`; only failures to open the
    /// accelerometer in the first place are returned as errors.
    pub async fn watch(&mut self) -> Result<()> {
        let reader = Reader::open(&self.config.accelerometer).await?;
        let (receiver, _sampler) = reader.spawn(self.config.refresh_rate);
        info!(
            accelerometer = %self.config.accelerometer,
            display = %self.config.display,
            touchscreens = self.config.touchscreens.len(),
            threshold = %self.config.threshold,
            refresh_rate_ms = self.config.refresh_rate.as_millis() as u64,
            max_ticks = self.config.max_ticks,
            "watching for orientation changes"
        );
        self.consume(receiver).await;
        self.metrics.log_summary();
        Ok(())
    }

    /// Consumer half: the single mutator of the debounce state. Dropping
    /// the receiver on exit is what stops the sampler task.
    async fn consume(&mut self, mut receiver: UnboundedReceiver<Sample>) {
        let mut summary_interval = tokio::time::interval(METRICS_SUMMARY_INTERVAL);
        // Skip the immediate first tick.
        summary_interval.tick().await;

        // Pinned once outside the loop so a SIGINT arriving while a sample
        // is being processed is still caught.
        let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

        loop {
            tokio::select! {
                sample = receiver.recv() => {
                    match sample {
                        Some(sample) => self.on_sample(sample).await,
                        None => {
                            warn!("sample channel closed, stopping watch");
                            break;
                        }
                    }
                }
                _ = summary_interval.tick() => {
                    self.metrics.log_summary();
                }
                _ = &mut shutdown => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }
    }

    /// Feed one sample through classify → debounce → (on commit) apply.
    ///
    /// An applier failure is logged and never retried; the committed state
    /// stands unless rollback-on-failure is configured.
    async fn on_sample(&mut self, sample: Sample) {
        self.metrics.record_sample();
        let previous = self.state.current();
        let proposed = classify(sample, previous, self.config.threshold);
        if let Some(committed) = self.state.observe(proposed, self.config.max_ticks) {
            self.metrics.record_commit();
            info!(from = %previous, to = %committed, "orientation committed");
            if let Err(e) = self.applier.apply(committed).await {
                self.metrics.record_apply_failure();
                error!(orientation = %committed, error = %e, "error changing orientation");
                if self.config.rollback_on_apply_failure {
                    warn!(orientation = %previous, "rolling back to previous orientation");
                    self.state.rollback(previous);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::Error;

    /// Applier double that records calls instead of spawning processes.
    #[derive(Clone, Default)]
    struct RecordingApplier {
        calls: Arc<Mutex<Vec<Orientation>>>,
        fail: bool,
    }

    impl RecordingApplier {
        fn calls(&self) -> Vec<Orientation> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OrientationApplier for RecordingApplier {
        async fn apply(&self, orientation: Orientation) -> crate::prelude::Result<()> {
            self.calls.lock().unwrap().push(orientation);
            if self.fail {
                return Err(Error::NoTouchscreens);
            }
            Ok(())
        }
    }

    fn config() -> AutorotateConfig {
        AutorotateConfig {
            display: ":0".to_string(),
            touchscreens: vec!["T1".to_string()],
            accelerometer: "iio:device0".to_string(),
            threshold: 7.0,
            refresh_rate: Duration::from_millis(200),
            max_ticks: 3,
            rollback_on_apply_failure: false,
        }
    }

    fn watcher(cfg: AutorotateConfig) -> (Autorotate<RecordingApplier>, RecordingApplier) {
        watcher_with(cfg, false)
    }

    fn watcher_with(
        cfg: AutorotateConfig,
        fail: bool,
    ) -> (Autorotate<RecordingApplier>, RecordingApplier) {
        let applier = RecordingApplier {
            fail,
            ..RecordingApplier::default()
        };
        let auto = Autorotate::new(cfg, applier.clone()).unwrap();
        (auto, applier)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let cfg = AutorotateConfig {
            threshold: 0.0,
            ..config()
        };
        assert!(Autorotate::new(cfg, RecordingApplier::default()).is_err());
    }

    #[tokio::test]
    async fn test_commits_once_after_full_window() {
        let (mut auto, applier) = watcher(config());

        // Already-current orientation evidence is a no-op.
        auto.on_sample(Sample { x: 0.0, y: -20.0 }).await;
        assert!(applier.calls().is_empty());

        // Four Inverted samples: proposal plus ticks 1..=3, still below the
        // commit bar of strictly more than max_ticks = 3.
        for _ in 0..4 {
            auto.on_sample(Sample { x: 0.0, y: 9.0 }).await;
            assert!(applier.calls().is_empty());
            assert_eq!(auto.orientation(), Orientation::Normal);
        }

        // The fifth sample crosses the bar; exactly one apply call.
        auto.on_sample(Sample { x: 0.0, y: 9.0 }).await;
        assert_eq!(applier.calls(), vec![Orientation::Inverted]);
        assert_eq!(auto.orientation(), Orientation::Inverted);

        // Further identical samples are no new evidence.
        auto.on_sample(Sample { x: 0.0, y: 9.0 }).await;
        assert_eq!(applier.calls(), vec![Orientation::Inverted]);
    }

    #[tokio::test]
    async fn test_noisy_sample_does_not_reset_window() {
        let cfg = AutorotateConfig {
            max_ticks: 1,
            ..config()
        };
        let (mut auto, applier) = watcher(cfg);

        auto.on_sample(Sample { x: 0.0, y: 9.0 }).await; // candidate
        auto.on_sample(Sample { x: 0.0, y: 9.0 }).await; // tick 1
        auto.on_sample(Sample { x: 0.0, y: 0.0 }).await; // reverts to current, no-op
        auto.on_sample(Sample { x: 0.0, y: 9.0 }).await; // tick 2 > 1, commits
        assert_eq!(applier.calls(), vec![Orientation::Inverted]);
    }

    #[tokio::test]
    async fn test_apply_failure_keeps_commit_by_default() {
        let cfg = AutorotateConfig {
            max_ticks: 0,
            ..config()
        };
        let (mut auto, applier) = watcher_with(cfg, true);

        auto.on_sample(Sample { x: 9.0, y: 0.0 }).await;
        auto.on_sample(Sample { x: 9.0, y: 0.0 }).await;
        assert_eq!(applier.calls(), vec![Orientation::Left]);
        // Optimistic commit: the state advanced even though apply failed.
        assert_eq!(auto.orientation(), Orientation::Left);
    }

    #[tokio::test]
    async fn test_apply_failure_rolls_back_when_configured() {
        let cfg = AutorotateConfig {
            max_ticks: 0,
            rollback_on_apply_failure: true,
            ..config()
        };
        let (mut auto, applier) = watcher_with(cfg, true);

        auto.on_sample(Sample { x: 9.0, y: 0.0 }).await;
        auto.on_sample(Sample { x: 9.0, y: 0.0 }).await;
        assert_eq!(applier.calls(), vec![Orientation::Left]);
        assert_eq!(auto.orientation(), Orientation::Normal);
    }

    #[tokio::test]
    async fn test_consume_ends_when_channel_closes() {
        let (mut auto, applier) = watcher(config());
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();

        for _ in 0..5 {
            sender.send(Sample { x: 0.0, y: 9.0 }).unwrap();
        }
        drop(sender);

        auto.consume(receiver).await;
        assert_eq!(applier.calls(), vec![Orientation::Inverted]);
        assert_eq!(auto.metrics.samples(), 5);
        assert_eq!(auto.metrics.commits(), 1);
    }
}
