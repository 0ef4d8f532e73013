//! Logged wrapper around external command invocation.

use std::ffi::OsStr;

use tokio::process::Command;
use tracing::{debug, error};

use crate::errors::Error;
use crate::prelude::Result;

/// Run an external command to completion, capturing stdout and stderr.
///
/// Returns the combined output on success. A spawn failure or a non-zero
/// exit status surfaces as an error carrying the captured output.
pub(crate) async fn run_command<S: AsRef<OsStr>>(name: &str, args: &[S]) -> Result<String> {
    debug!(
        command = %name,
        args = ?args.iter().map(|a| a.as_ref().to_string_lossy()).collect::<Vec<_>>(),
        "executing command"
    );
    let output = Command::new(name)
        .args(args)
        .output()
        .await
        .map_err(|source| Error::CommandSpawn {
            command: name.to_string(),
            source,
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        error!(
            command = %name,
            status = %output.status,
            output = %combined.trim(),
            "command failed"
        );
        return Err(Error::CommandFailed {
            command: name.to_string(),
            status: output.status,
            output: combined,
        });
    }

    debug!(command = %name, "command ok");
    Ok(combined)
}
