//! Sysfs IIO accelerometer access: autodetection and periodic sampling.
//!
//! The kernel exposes one directory per IIO device under
//! `/sys/bus/iio/devices`, with one file per channel attribute. Raw channel
//! values change in place, so the value files are opened once and re-read
//! with a seek on every poll.

use std::io::SeekFrom;
use std::num::ParseFloatError;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::consts::ACCELEROMETER_HOME;
use crate::errors::Error;
use crate::prelude::Result;

/// A single scaled tilt reading.
///
/// The z component carries no orientation evidence and is never read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Gravity component along the device's x axis, in scaled units.
    pub x: f64,
    /// Gravity component along the device's y axis, in scaled units.
    pub y: f64,
}

/// Scan the IIO sysfs tree for the first device exposing accelerometer
/// channels and return its directory name (e.g. `iio:device0`).
pub async fn detect_accelerometer() -> Result<String> {
    detect_accelerometer_in(Path::new(ACCELEROMETER_HOME)).await
}

async fn detect_accelerometer_in(home: &Path) -> Result<String> {
    let mut entries = fs::read_dir(home).await.map_err(|source| Error::Sysfs {
        path: home.to_path_buf(),
        source,
    })?;

    let mut devices = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|source| Error::Sysfs {
        path: home.to_path_buf(),
        source,
    })? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with("iio:device") {
            continue;
        }
        let x_raw = entry.path().join("in_accel_x_raw");
        if fs::try_exists(&x_raw).await.unwrap_or(false) {
            devices.push(name);
        }
    }

    // Directory enumeration order is arbitrary; sort so the pick is stable.
    devices.sort();
    devices
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoAccelerometer(home.display().to_string()))
}

fn parse_value(raw: &str) -> std::result::Result<f64, ParseFloatError> {
    raw.trim().parse()
}

/// One open sysfs attribute file, re-readable in place.
struct ValueFile {
    path: PathBuf,
    file: File,
}

impl ValueFile {
    async fn open(path: PathBuf) -> Result<Self> {
        let file = File::open(&path).await.map_err(|source| Error::Sysfs {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, file })
    }

    /// Seek back to the start and parse the current value. Sysfs attribute
    /// reads yield the whole value followed by a newline.
    async fn read(&mut self) -> Result<f64> {
        self.file
            .seek(SeekFrom::Start(0))
            .await
            .map_err(|source| Error::Sysfs {
                path: self.path.clone(),
                source,
            })?;
        let mut buf = String::new();
        self.file
            .read_to_string(&mut buf)
            .await
            .map_err(|source| Error::Sysfs {
                path: self.path.clone(),
                source,
            })?;
        parse_value(&buf).map_err(|source| Error::SampleParse {
            path: self.path.clone(),
            source,
        })
    }
}

/// Open handles onto one accelerometer's channel files.
///
/// The scale factor is read once at open; every sample multiplies the raw
/// x/y readings by it.
pub struct Reader {
    scale: f64,
    x: ValueFile,
    y: ValueFile,
}

impl Reader {
    /// Open the named device under the IIO sysfs tree.
    pub async fn open(accelerometer: &str) -> Result<Self> {
        Self::open_in(Path::new(ACCELEROMETER_HOME), accelerometer).await
    }

    async fn open_in(home: &Path, accelerometer: &str) -> Result<Self> {
        let dir = home.join(accelerometer);
        let mut scale_file = ValueFile::open(dir.join("in_accel_scale")).await?;
        let scale = scale_file.read().await?;
        let x = ValueFile::open(dir.join("in_accel_x_raw")).await?;
        let y = ValueFile::open(dir.join("in_accel_y_raw")).await?;
        info!(accelerometer = %accelerometer, scale = %scale, "accelerometer opened");
        Ok(Self { scale, x, y })
    }

    /// Read one scaled sample.
    pub async fn read_sample(&mut self) -> Result<Sample> {
        let x = self.x.read().await? * self.scale;
        let y = self.y.read().await? * self.scale;
        Ok(Sample { x, y })
    }

    /// Spawn the producer task: one sample per refresh interval, published
    /// into an ordered channel.
    ///
    /// A read failure is logged and ends the task, closing the channel so
    /// the consumer can wind down cleanly. Dropping the receiver also ends
    /// the task on its next send.
    pub fn spawn(mut self, refresh_rate: Duration) -> (UnboundedReceiver<Sample>, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            loop {
                let sample = match self.read_sample().await {
                    Ok(sample) => sample,
                    Err(e) => {
                        error!(error = %e, "cannot read accelerometer value, stopping sampler");
                        break;
                    }
                };
                if sender.send(sample).is_err() {
                    debug!("sample channel closed, stopping sampler");
                    break;
                }
                tokio::time::sleep(refresh_rate).await;
            }
        });
        (receiver, handle)
    }
}
