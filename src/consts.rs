//! Crate-wide constants.

/// Root of the Linux IIO sysfs tree where accelerometers appear.
pub const ACCELEROMETER_HOME: &str = "/sys/bus/iio/devices";

/// Substrings matched against `xinput list --name-only` output when
/// autodetecting touchscreen devices.
pub const TOUCHSCREEN_KEYWORDS: &[&str] = &["Wacom HID"];

/// Bound on gravity component magnitude in scaled units. Edge rules span
/// from the tilt threshold out to this value.
pub const GRAVITY_RANGE: f64 = 100.0;
