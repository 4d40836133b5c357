//! Progress observations emitted by the copier and relayed by the driver.

use crate::error::Error;
use std::path::PathBuf;
use std::time::Duration;

/// Where a file is in its copy lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    /// A chunk was written to the temporary file; more observations follow.
    Transferring,
    /// Terminal: the verified copy was renamed into place.
    Copied,
    /// Terminal: the destination already had the source's size and was left alone.
    Skipped,
    /// Terminal: the file could not be copied; `error` says why.
    Failed,
}

/// One observation about one destination file.
///
/// Every file produces zero or more [`Stage::Transferring`] observations
/// followed by exactly one terminal observation.
#[derive(Debug)]
pub struct Progress {
    /// Destination path (absolute, slash-normalized)
    pub path: PathBuf,
    /// Declared source size in bytes (0 when unknown)
    pub total: u64,
    /// Bytes written so far
    pub current: u64,
    /// Estimated time until this file is written; zero when unknown or finished
    pub time_left: Duration,
    /// Lifecycle stage
    pub stage: Stage,
    /// Failure, set exactly when `stage` is [`Stage::Failed`]
    pub error: Option<Error>,
}

impl Progress {
    pub(crate) fn transferring(
        path: PathBuf,
        total: u64,
        current: u64,
        time_left: Duration,
    ) -> Self {
        Self {
            path,
            total,
            current,
            time_left,
            stage: Stage::Transferring,
            error: None,
        }
    }

    pub(crate) fn copied(path: PathBuf, total: u64) -> Self {
        Self {
            path,
            total,
            current: total,
            time_left: Duration::ZERO,
            stage: Stage::Copied,
            error: None,
        }
    }

    pub(crate) fn skipped(path: PathBuf, total: u64) -> Self {
        Self {
            path,
            total,
            current: total,
            time_left: Duration::ZERO,
            stage: Stage::Skipped,
            error: None,
        }
    }

    pub(crate) fn failed(path: PathBuf, total: u64, current: u64, error: Error) -> Self {
        Self {
            path,
            total,
            current,
            time_left: Duration::ZERO,
            stage: Stage::Failed,
            error: Some(error),
        }
    }

    /// Whether this is the last observation for its file.
    pub fn is_terminal(&self) -> bool {
        self.stage != Stage::Transferring
    }

    /// Whether this observation carries no error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Straight-line estimate of the time left: `elapsed * total / current - elapsed`.
pub(crate) fn estimate_time_left(elapsed: Duration, total: u64, current: u64) -> Duration {
    if current == 0 || current >= total {
        return Duration::ZERO;
    }
    let ratio = total as f64 / current as f64;
    Duration::try_from_secs_f64(elapsed.as_secs_f64() * ratio)
        .unwrap_or(Duration::MAX)
        .saturating_sub(elapsed)
}
