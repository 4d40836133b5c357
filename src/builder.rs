//! Builder API for ergonomic copying operations.
//!
//! The builder pattern provides a fluent interface for configuring and executing
//! copy operations. It drains the progress stream itself and folds it into a
//! [`CopyStats`] summary.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use checkcopy::CopyBuilder;
//!
//! let stats = CopyBuilder::new("photos", "backup").run()?;
//! println!("Copied {} files", stats.files_copied);
//! # Ok::<(), checkcopy::Error>(())
//! ```
//!
//! ## Watching Progress
//!
//! ```no_run
//! use checkcopy::{CopyBuilder, Stage};
//!
//! let stats = CopyBuilder::new("photos", "backup")
//!     .buffer_size(8 * 1024 * 1024)
//!     .verify_existing()
//!     .run_with(|progress| {
//!         if progress.stage == Stage::Copied {
//!             println!("{}", progress.path.display());
//!         }
//!     })?;
//! # Ok::<(), checkcopy::Error>(())
//! ```

use crate::copy::{CopyStats, Progress, spawn_copy_dir, spawn_copy_file};
use crate::error::{Error, Result};
use crate::options::{CopyOptions, TempPolicy};
use crate::walk::FileRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

/// A builder for configuring and executing copy operations.
///
/// Detects whether the source is a single regular file or a directory and
/// runs the matching copier.
///
/// # Example
///
/// ```no_run
/// use checkcopy::CopyBuilder;
///
/// let stats = CopyBuilder::new("/data/photos", "/backup/photos")
///     .batch_size(64)
///     .no_fsync()
///     .run()?;
/// # Ok::<(), checkcopy::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CopyBuilder {
    src: PathBuf,
    dst: PathBuf,
    options: CopyOptions,
}

impl CopyBuilder {
    /// Create a new `CopyBuilder` with the given source and destination paths.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> Self {
        Self {
            src: src.as_ref().to_path_buf(),
            dst: dst.as_ref().to_path_buf(),
            options: CopyOptions::default(),
        }
    }

    /// Set the copy buffer size in bytes.
    ///
    /// Default is 64 MiB. One progress observation is sent per filled buffer.
    #[must_use]
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.options = self.options.with_buffer_size(bytes);
        self
    }

    /// Set how many directory entries the walker reads at a time.
    #[must_use]
    pub fn batch_size(mut self, entries: usize) -> Self {
        self.options = self.options.with_batch_size(entries);
        self
    }

    /// Hash same-size destinations before skipping them.
    ///
    /// A destination with the source's size but different content is copied
    /// again instead of being skipped.
    #[must_use]
    pub fn verify_existing(mut self) -> Self {
        self.options = self.options.with_verify_existing();
        self
    }

    /// Keep `<dst>.temp` on disk when a copy fails.
    #[must_use]
    pub fn retain_failed_temp(mut self) -> Self {
        self.options = self.options.with_temp_policy(TempPolicy::Retain);
        self
    }

    /// Skip the fsync before verification.
    ///
    /// Faster, but a crash right after the rename may leave a short file.
    #[must_use]
    pub fn no_fsync(mut self) -> Self {
        self.options = self.options.without_fsync();
        self
    }

    /// Don't copy the source modification time onto the copy.
    #[must_use]
    pub fn no_timestamps(mut self) -> Self {
        self.options = self.options.without_timestamps();
        self
    }

    /// Set a cancellation token.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use checkcopy::CopyBuilder;
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    ///
    /// let cancel = Arc::new(AtomicBool::new(false));
    /// let token = cancel.clone();
    /// ctrlc_like_handler(move || token.store(true, Ordering::Relaxed));
    ///
    /// let result = CopyBuilder::new("src", "dst").cancel_token(cancel).run();
    /// # fn ctrlc_like_handler(_f: impl Fn()) {}
    /// ```
    #[must_use]
    pub fn cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.options = self.options.with_cancel_token(token);
        self
    }

    /// Set a handler for warnings.
    #[must_use]
    pub fn on_warning(mut self, handler: fn(&str)) -> Self {
        self.options = self.options.with_warn_handler(handler);
        self
    }

    /// Set a handler for per-file verbose messages.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use checkcopy::CopyBuilder;
    ///
    /// let stats = CopyBuilder::new("src", "dst")
    ///     .verbose(|msg| println!("{}", msg))
    ///     .run()?;
    /// # Ok::<(), checkcopy::Error>(())
    /// ```
    #[must_use]
    pub fn verbose(mut self, handler: fn(&str)) -> Self {
        self.options = self.options.with_verbose_handler(handler);
        self
    }

    /// Get a reference to the current options.
    pub fn options(&self) -> &CopyOptions {
        &self.options
    }

    /// Execute the copy operation.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if the cancellation token was raised
    /// - the file's own error if a single-file copy failed
    /// - [`Error::PartialCopy`] if any file of a directory copy failed
    /// - [`Error::Spawn`] if the worker thread could not be started
    pub fn run(self) -> Result<CopyStats> {
        self.run_with(|_| {})
    }

    /// Execute the copy operation, passing every observation to `on_progress`
    /// as it arrives.
    ///
    /// # Errors
    ///
    /// Same as [`CopyBuilder::run`].
    pub fn run_with(self, mut on_progress: impl FnMut(&Progress)) -> Result<CopyStats> {
        let start = Instant::now();
        let single_file = fs::symlink_metadata(&self.src).is_ok_and(|meta| meta.is_file());

        let stream = if single_file {
            spawn_copy_file(FileRecord::new(&self.src), &self.dst, &self.options)?
        } else {
            spawn_copy_dir(&self.src, &self.dst, &self.options)?
        };

        let mut stats = CopyStats::default();
        let mut cancelled = false;
        let mut file_error = None;
        for progress in stream {
            stats.record(&progress);
            on_progress(&progress);
            if let Some(error) = progress.error {
                if error.is_cancelled() {
                    cancelled = true;
                } else if single_file {
                    file_error = Some(error);
                }
            }
        }
        stats.duration = start.elapsed();

        if cancelled {
            return Err(Error::Cancelled(self.dst));
        }
        if let Some(error) = file_error {
            return Err(error);
        }
        if stats.files_failed > 0 {
            return Err(Error::PartialCopy {
                failed: stats.files_failed,
                total: stats.files_copied + stats.files_skipped + stats.files_failed,
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            copied = stats.files_copied,
            skipped = stats.files_skipped,
            bytes = stats.bytes_copied,
            elapsed = ?stats.duration,
            "copy finished"
        );

        Ok(stats)
    }
}
