#![deny(unreachable_pub)]

// Core modules
mod consts;
mod errors;
mod exec;
mod prelude;

// Feature modules
pub mod accelerometer;
mod rotation;

// Re-exports
pub use accelerometer::{detect_accelerometer, Reader, Sample};
pub use consts::{ACCELEROMETER_HOME, GRAVITY_RANGE, TOUCHSCREEN_KEYWORDS};
pub use errors::Error;
pub use rotation::{
    classify, detect_touchscreens, Autorotate, AutorotateConfig, Axis, DebounceState, Edge,
    Orientation, OrientationApplier, WatchMetrics, XApplier,
};
