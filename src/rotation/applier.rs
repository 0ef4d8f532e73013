//! Applying a committed orientation to the display and touch devices.

use async_trait::async_trait;
use tracing::info;

use crate::consts::TOUCHSCREEN_KEYWORDS;
use crate::errors::Error;
use crate::exec::run_command;
use crate::prelude::Result;

use super::orientation::Orientation;

/// Capability seam on the commit path.
///
/// The production implementation spawns xrandr/xinput; tests substitute a
/// double that records calls instead.
#[async_trait]
pub trait OrientationApplier: Send + Sync {
    /// Apply the orientation to the display output and every touch device.
    async fn apply(&self, orientation: Orientation) -> Result<()>;
}

/// Applies orientations through `xrandr` and `xinput`.
#[derive(Debug, Clone)]
pub struct XApplier {
    display: String,
    touchscreens: Vec<String>,
}

impl XApplier {
    pub fn new(display: impl Into<String>, touchscreens: Vec<String>) -> Self {
        Self {
            display: display.into(),
            touchscreens,
        }
    }
}

#[async_trait]
impl OrientationApplier for XApplier {
    /// Rotate the display, then remap each touchscreen in order. The first
    /// command failure aborts the sequence and surfaces to the caller.
    async fn apply(&self, orientation: Orientation) -> Result<()> {
        info!(
            orientation = %orientation,
            display = %self.display,
            touchscreens = self.touchscreens.len(),
            "applying orientation"
        );
        run_command("xrandr", &xrandr_args(&self.display, orientation)).await?;
        for touchscreen in &self.touchscreens {
            run_command("xinput", &xinput_args(touchscreen, orientation)).await?;
        }
        Ok(())
    }
}

fn xrandr_args(display: &str, orientation: Orientation) -> Vec<String> {
    vec![
        "-d".to_string(),
        display.to_string(),
        "-o".to_string(),
        orientation.as_str().to_string(),
    ]
}

fn xinput_args(touchscreen: &str, orientation: Orientation) -> Vec<String> {
    let mut args = vec![
        "set-prop".to_string(),
        touchscreen.to_string(),
        "Coordinate Transformation Matrix".to_string(),
    ];
    args.extend(orientation.transform_matrix().map(|v| v.to_string()));
    args
}

/// List touch devices by filtering `xinput list --name-only` output against
/// the autodetection keywords.
pub async fn detect_touchscreens() -> Result<Vec<String>> {
    let names = run_command("xinput", &["list", "--name-only"]).await?;
    let screens = filter_touchscreen_names(&names);
    if screens.is_empty() {
        return Err(Error::NoTouchscreens);
    }
    Ok(screens)
}

fn filter_touchscreen_names(names: &str) -> Vec<String> {
    names
        .lines()
        .filter(|name| TOUCHSCREEN_KEYWORDS.iter().any(|kw| name.contains(kw)))
        .map(str::to_string)
        .collect()
}
