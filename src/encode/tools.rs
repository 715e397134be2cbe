use std::path::Path;
use std::process::{Command, Output, Stdio};

use tokio::task;
use tracing::debug;

use crate::error::{MediaError, Result};

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";
pub const GIFSICLE: &str = "gifsicle";

/// Whether `program` can be started from `PATH`
pub fn is_available(program: &str) -> bool {
    let version_flag = if program == GIFSICLE { "--version" } else { "-version" };
    Command::new(program)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Fail early with a readable error when a tool is missing
pub fn require(program: &str) -> Result<()> {
    if is_available(program) {
        Ok(())
    } else {
        Err(MediaError::ToolMissing { tool: program.to_string() }.into())
    }
}

/// Base ffmpeg invocation: quiet, overwrite outputs
pub fn ffmpeg() -> Command {
    let mut cmd = Command::new(FFMPEG);
    cmd.args(["-hide_banner", "-loglevel", "error", "-y"]);
    cmd
}

/// Where pass-one output of a two-pass encode is discarded
pub fn null_device() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

/// Run a command off the async runtime and fail on a non-zero exit
pub async fn run(mut cmd: Command, step: &str) -> Result<Output> {
    debug!("Running {}: {:?}", step, cmd);

    let output = task::spawn_blocking(move || cmd.output())
        .await
        .map_err(|e| MediaError::EncodingFailed {
            reason: format!("{}: blocking task failed: {}", step, e),
        })?
        .map_err(|e| MediaError::EncodingFailed {
            reason: format!("{}: failed to spawn process: {}", step, e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::EncodingFailed {
            reason: format!("{} failed: {}", step, stderr.trim()),
        }
        .into());
    }

    Ok(output)
}

/// Duration of a media file in seconds, as reported by ffprobe
pub async fn probe_duration<P: AsRef<Path>>(path: P) -> Result<f64> {
    let path = path.as_ref();
    let mut cmd = Command::new(FFPROBE);
    cmd.args([
        "-v", "error",
        "-show_entries", "format=duration",
        "-of", "default=noprint_wrappers=1:nokey=1",
    ])
    .arg(path);

    let output = run(cmd, "ffprobe").await.map_err(|e| MediaError::ProbeFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_duration(&stdout).ok_or_else(|| {
        MediaError::ProbeFailed {
            path: path.display().to_string(),
            reason: format!("unexpected ffprobe output '{}'", stdout.trim()),
        }
        .into()
    })
}

fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())?
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite())
}
