//! Watcher configuration and validation.

use std::time::Duration;

use crate::errors::Error;
use crate::prelude::Result;

/// Validated configuration for one watch loop.
///
/// All fields are fixed at construction; invalid values are rejected before
/// the watch loop starts, never at runtime.
#[derive(Debug, Clone)]
pub struct AutorotateConfig {
    /// xrandr display identifier, e.g. `:0`.
    pub display: String,
    /// xinput device names whose coordinate transform follows the display.
    pub touchscreens: Vec<String>,
    /// IIO device directory name under the sysfs tree, e.g. `iio:device0`.
    pub accelerometer: String,
    /// Minimum tilt magnitude treated as a deliberate orientation change,
    /// in scaled gravity units.
    pub threshold: f64,
    /// Delay between accelerometer polls.
    pub refresh_rate: Duration,
    /// Consecutive confirming samples required beyond the initial proposal
    /// before a candidate orientation is committed.
    pub max_ticks: u32,
    /// Undo the in-memory commit when applying the orientation fails.
    /// Off by default: the commit normally stands even if xrandr/xinput
    /// report an error.
    pub rollback_on_apply_failure: bool,
}

impl AutorotateConfig {
    /// Check the invariants that make a watch loop runnable.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(Error::InvalidThreshold(self.threshold));
        }
        if self.display.is_empty() {
            return Err(Error::InvalidConfig("display must not be empty".into()));
        }
        if self.accelerometer.is_empty() {
            return Err(Error::InvalidConfig(
                "accelerometer must not be empty".into(),
            ));
        }
        if self.touchscreens.is_empty() || self.touchscreens.iter().any(|t| t.is_empty()) {
            return Err(Error::InvalidConfig(
                "touchscreen list must not be empty".into(),
            ));
        }
        if self.refresh_rate.is_zero() {
            return Err(Error::InvalidConfig("refresh rate must be positive".into()));
        }
        Ok(())
    }
}
