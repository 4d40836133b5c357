//! Directory copy operations.
//!
//! The driver pulls one [`FileRecord`] at a time from a walker and hands it to
//! the single-file copier, relaying every observation to the caller in walker
//! order. Files are copied strictly one after another: the next record is not
//! taken until the previous copier has closed its stream.

use crate::error::{Error, Result};
use crate::options::CopyOptions;
use crate::utils::path::{normalize, rebase};
use crate::walk::{FileRecord, walk};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::Path;
use std::thread;
use std::time::Duration;

use super::file::copy_file;
use super::observation::{Progress, Stage};

/// Statistics from a copy operation.
///
/// Fold observations into it with [`CopyStats::record`]; only terminal
/// observations change the counts.
///
/// # Example
///
/// ```no_run
/// use checkcopy::{CopyOptions, CopyStats, spawn_copy_dir};
///
/// let mut stats = CopyStats::default();
/// for progress in spawn_copy_dir("src", "dst", &CopyOptions::default())? {
///     stats.record(&progress);
/// }
/// println!("Copied {} files ({} bytes)", stats.files_copied, stats.bytes_copied);
/// # Ok::<(), checkcopy::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Number of files copied and verified
    pub files_copied: u64,
    /// Number of files skipped (destination already had the source size)
    pub files_skipped: u64,
    /// Number of files that failed, cancellation excluded
    pub files_failed: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Duration of the copy operation
    pub duration: Duration,
}

impl CopyStats {
    /// Account for one observation.
    pub fn record(&mut self, progress: &Progress) {
        match progress.stage {
            Stage::Transferring => {}
            Stage::Copied => {
                self.files_copied += 1;
                self.bytes_copied += progress.total;
            }
            Stage::Skipped => self.files_skipped += 1,
            Stage::Failed => {
                if !progress.error.as_ref().is_some_and(Error::is_cancelled) {
                    self.files_failed += 1;
                }
            }
        }
    }
}

/// What the driver should do after relaying a file's observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relay {
    Continue,
    /// The copier already reported the cancellation.
    Cancelled,
    /// The caller dropped its receiver.
    Disconnected,
}

/// Copy every file under `src` to the same relative path under `dst`,
/// reporting on `progress`.
///
/// # Strategy
///
/// 1. Normalize both roots
/// 2. Walk `src` on a scoped thread with its own rendezvous channel
/// 3. For each record, run [`copy_file`] on a scoped thread and drain its
///    observations into `progress` before taking the next record
///
/// A record that carries an error is forwarded as a [`Stage::Failed`]
/// observation at its destination path. A failure on one file never stops
/// the others. When the cancellation token is raised the run stops and
/// exactly one cancelled observation is sent.
///
/// `progress` is dropped on return.
pub fn copy_dir(src: &Path, dst: &Path, options: &CopyOptions, progress: Sender<Progress>) {
    let src_root = match normalize(src) {
        Ok(path) => path,
        Err(error) => {
            let _ = progress.send(Progress::failed(src.to_path_buf(), 0, 0, error));
            return;
        }
    };
    let dst_root = match normalize(dst) {
        Ok(path) => path,
        Err(error) => {
            let _ = progress.send(Progress::failed(dst.to_path_buf(), 0, 0, error));
            return;
        }
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(src = %src_root.display(), dst = %dst_root.display(), "directory copy started");

    thread::scope(|scope| {
        let (records_tx, records) = bounded(0);
        let walk_root = src_root.as_path();
        let walker = thread::Builder::new()
            .name("checkcopy-walk".into())
            .spawn_scoped(scope, move || walk(walk_root, records_tx, options));
        if let Err(source) = walker {
            let error = Error::Spawn {
                path: src_root.clone(),
                source,
            };
            let _ = progress.send(Progress::failed(dst_root.clone(), 0, 0, error));
            return;
        }

        let mut cancel_reported = false;
        for mut record in records.iter() {
            if options.is_cancelled() {
                break;
            }

            let target = rebase(&record.path, &src_root, &dst_root)
                .unwrap_or_else(|| dst_root.clone());

            let relay = match record.error.take() {
                Some(error) => send(&progress, Progress::failed(target, 0, 0, error)),
                None => copy_one(record, &target, options, &progress),
            };

            match relay {
                Relay::Continue => {}
                Relay::Cancelled => {
                    cancel_reported = true;
                    break;
                }
                Relay::Disconnected => return,
            }
        }
        // Unblocks the walker if the loop stopped early
        drop(records);

        if options.is_cancelled() && !cancel_reported {
            options.warn(&format!("Copy to {} cancelled", dst_root.display()));
            let error = Error::Cancelled(dst_root.clone());
            let _ = progress.send(Progress::failed(dst_root.clone(), 0, 0, error));
        }
    });

    #[cfg(feature = "tracing")]
    tracing::debug!(dst = %dst_root.display(), "directory copy finished");
}

/// Start [`copy_dir`] on a background thread and return its progress stream.
///
/// # Errors
///
/// Returns [`Error::Spawn`] if the thread cannot be started.
///
/// # Example
///
/// ```no_run
/// use checkcopy::{CopyOptions, spawn_copy_dir};
///
/// for progress in spawn_copy_dir("photos", "backup", &CopyOptions::default())? {
///     if let Some(error) = &progress.error {
///         eprintln!("{}", error);
///     }
/// }
/// # Ok::<(), checkcopy::Error>(())
/// ```
pub fn spawn_copy_dir(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    options: &CopyOptions,
) -> Result<Receiver<Progress>> {
    let src = src.as_ref().to_path_buf();
    let dst = dst.as_ref().to_path_buf();
    let spawn_path = src.clone();
    let options = options.clone();
    let (progress, stream) = bounded(0);

    thread::Builder::new()
        .name("checkcopy-dir".into())
        .spawn(move || copy_dir(&src, &dst, &options, progress))
        .map_err(|source| Error::Spawn {
            path: spawn_path,
            source,
        })?;

    Ok(stream)
}

/// Copy one file on a scoped thread and relay its whole stream.
fn copy_one(
    record: FileRecord,
    target: &Path,
    options: &CopyOptions,
    progress: &Sender<Progress>,
) -> Relay {
    thread::scope(|scope| {
        let (observations, stream) = bounded(0);
        let copier = thread::Builder::new()
            .name("checkcopy-copy".into())
            .spawn_scoped(scope, move || copy_file(record, target, options, observations));
        if let Err(source) = copier {
            let error = Error::Spawn {
                path: target.to_path_buf(),
                source,
            };
            return send(progress, Progress::failed(target.to_path_buf(), 0, 0, error));
        }

        let mut relay = Relay::Continue;
        for observation in stream {
            let cancelled = observation.error.as_ref().is_some_and(Error::is_cancelled);
            if progress.send(observation).is_err() {
                return Relay::Disconnected;
            }
            if cancelled {
                relay = Relay::Cancelled;
            }
        }
        relay
    })
}

fn send(progress: &Sender<Progress>, observation: Progress) -> Relay {
    match progress.send(observation) {
        Ok(()) => Relay::Continue,
        Err(_) => Relay::Disconnected,
    }
}

// =============================================================================
// Tests
// =============================================================================
