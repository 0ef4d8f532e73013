use std::io;
use std::num::ParseFloatError;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced by device detection, sampling, and orientation
/// application.
///
/// `NoAccelerometer`, `NoTouchscreens`, `InvalidThreshold`, and
/// `InvalidConfig` are construction-time failures that end the process
/// before the watch loop starts. `Sysfs` and `SampleParse` end the sampling
/// task (and with it the watch) when they occur mid-run. `CommandSpawn` and
/// `CommandFailed` are logged on the commit path and never retried.
#[derive(Error, Debug)]
pub enum Error {
    /// No IIO device under the sysfs tree exposes accelerometer channels.
    #[error("no accelerometers found under {0}")]
    NoAccelerometer(String),

    /// Touchscreen autodetection matched no input devices.
    #[error("no touchscreens found")]
    NoTouchscreens,

    /// Tilt threshold outside the valid range.
    #[error("threshold must be a positive finite number, got {0}")]
    InvalidThreshold(f64),

    /// Any other construction-time configuration problem.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sysfs file could not be opened or read.
    #[error("cannot access {}: {source}", path.display())]
    Sysfs {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Sysfs attribute did not hold a parseable number.
    #[error("cannot parse value from {}: {source}", path.display())]
    SampleParse {
        path: PathBuf,
        #[source]
        source: ParseFloatError,
    },

    /// External command could not be started.
    #[error("failed to spawn {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// External command ran but exited unsuccessfully.
    #[error("{command} exited with {status}: {output}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        output: String,
    },
}
