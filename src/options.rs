//! Configuration options for copy operations.
//!
//! This module provides [`CopyOptions`] for configuring copy behavior and
//! [`TempPolicy`] for deciding what happens to `<dst>.temp` files when a
//! copy fails.
//!
//! # Example
//!
//! ```
//! use checkcopy::{CopyOptions, TempPolicy};
//!
//! let options = CopyOptions::default()
//!     .with_buffer_size(1024 * 1024)
//!     .with_batch_size(64)
//!     .with_temp_policy(TempPolicy::Retain);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default size of the single copy buffer (64 MiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Default number of directory entries read per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// What to do with `<dst>.temp` when a copy does not complete.
///
/// The policy is applied on every non-success path once the temporary file
/// has been created: read/write errors, checksum mismatches, timestamp and
/// rename failures, and cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TempPolicy {
    /// Delete the temporary file (default).
    #[default]
    Remove,
    /// Leave the temporary file on disk for post-mortem inspection.
    ///
    /// A later run replaces it before writing a fresh copy.
    Retain,
}

/// Options for copy operations.
///
/// Use [`Default::default()`] to get sensible defaults, then customize
/// using the builder methods.
///
/// # Default Values
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `buffer_size` | 64 MiB | Bytes read and written per chunk |
/// | `batch_size` | 10 | Directory entries read per batch |
/// | `verify_existing` | `false` | Hash same-size destinations before skipping |
/// | `temp_policy` | `Remove` | Delete `<dst>.temp` on failure |
/// | `fsync` | `true` | Sync the copy to disk before verifying |
/// | `preserve_timestamps` | `true` | Copy the source mtime onto the copy |
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CopyOptions {
    /// Size in bytes of the single transfer buffer (default: 64 MiB)
    ///
    /// One progress observation is emitted per filled buffer.
    pub buffer_size: usize,

    /// Number of directory entries the walker reads per batch (default: 10)
    ///
    /// At most this many names are held in memory per open directory level.
    pub batch_size: usize,

    /// Hash destinations whose size already matches the source (default: false)
    ///
    /// By default an existing destination of identical size is treated as
    /// already copied without reading either file. When enabled, both files
    /// are hashed and a mismatch triggers a fresh copy.
    pub verify_existing: bool,

    /// What to do with the temporary file when a copy fails
    pub temp_policy: TempPolicy,

    /// Whether to sync the copy to disk before verifying it (default: true)
    pub fsync: bool,

    /// Whether to set the copy's atime and mtime to the source mtime (default: true)
    pub preserve_timestamps: bool,

    /// Cancellation token for cooperative cancellation
    ///
    /// When set to `true`, the walker stops, an in-flight copy emits a
    /// terminal [`Error::Cancelled`](crate::Error::Cancelled) observation,
    /// and the directory driver closes its stream.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub cancel_token: Option<Arc<AtomicBool>>,

    /// Callback for warnings (optional)
    ///
    /// If not set and `tracing` feature is enabled, warnings are logged via tracing.
    /// Otherwise, warnings are silently ignored.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub warn_handler: Option<fn(&str)>,

    /// Callback for per-file verbose notes (optional)
    ///
    /// If not set and `tracing` feature is enabled, notes are logged at debug level.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub verbose_handler: Option<fn(&str)>,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            verify_existing: false,
            temp_policy: TempPolicy::Remove,
            fsync: true,
            preserve_timestamps: true,
            cancel_token: None,
            warn_handler: None,
            verbose_handler: None,
        }
    }
}

impl CopyOptions {
    /// Set the transfer buffer size in bytes
    ///
    /// Value is clamped to at least 1.
    #[must_use]
    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes.max(1);
        self
    }

    /// Set the number of directory entries read per batch
    ///
    /// Value is clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, entries: usize) -> Self {
        self.batch_size = entries.max(1);
        self
    }

    /// Hash same-size destinations instead of trusting their size
    #[must_use]
    pub fn with_verify_existing(mut self) -> Self {
        self.verify_existing = true;
        self
    }

    /// Set the temporary file policy
    #[must_use]
    pub fn with_temp_policy(mut self, policy: TempPolicy) -> Self {
        self.temp_policy = policy;
        self
    }

    /// Disable fsync for faster (but less durable) copies
    #[must_use]
    pub fn without_fsync(mut self) -> Self {
        self.fsync = false;
        self
    }

    /// Disable timestamp preservation
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.preserve_timestamps = false;
        self
    }

    /// Set a cancellation token
    ///
    /// # Example
    ///
    /// ```
    /// use checkcopy::CopyOptions;
    /// use std::sync::Arc;
    /// use std::sync::atomic::AtomicBool;
    ///
    /// let cancel = Arc::new(AtomicBool::new(false));
    /// let options = CopyOptions::default().with_cancel_token(cancel.clone());
    /// ```
    #[must_use]
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Create options with a warning handler
    #[must_use]
    pub fn with_warn_handler(mut self, handler: fn(&str)) -> Self {
        self.warn_handler = Some(handler);
        self
    }

    /// Create options with a verbose handler
    #[must_use]
    pub fn with_verbose_handler(mut self, handler: fn(&str)) -> Self {
        self.verbose_handler = Some(handler);
        self
    }

    /// Whether the cancellation token has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(|token| token.load(Ordering::Relaxed))
    }

    pub(crate) fn warn(&self, msg: &str) {
        if let Some(handler) = self.warn_handler {
            handler(msg);
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!("{}", msg);
        }
    }

    pub(crate) fn verbose(&self, msg: &str) {
        if let Some(handler) = self.verbose_handler {
            handler(msg);
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!("{}", msg);
        }
    }
}
