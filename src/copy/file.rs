//! Single file copy operations.
//!
//! The copier writes to `<dst>.temp`, verifies the copy's MD5 against the
//! source, stamps the source mtime onto it and only then renames it to
//! `<dst>`. The final path therefore never holds unverified content.
//!
//! Progress is streamed as [`Progress`] observations: one per filled buffer
//! plus exactly one terminal observation, after which the stream is closed.

use crate::error::{Error, Result};
use crate::options::{CopyOptions, TempPolicy};
use crate::utils::path::{normalize, temp_path};
use crate::walk::FileRecord;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::fs::{self, File, Metadata};
use std::io::{self, Read, Write};
use std::path::Path;
use std::thread;
use std::time::Instant;
use tempfile::NamedTempFile;

use super::checksum::verify_copy;
use super::observation::{Progress, estimate_time_left};
use super::utils::{create_parent_dirs, fill_buffer, preserve_timestamps};

/// How a copy finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Copied,
    Skipped,
}

/// Copy one regular file to `dst`, reporting on `progress`.
///
/// Steps, in order:
///
/// 1. Normalize `dst` and create its missing parent directories (`0755`).
/// 2. Read the source metadata if the record carries none; reject anything
///    that is not a regular file.
/// 3. Compare with an existing destination: same size is treated as already
///    copied (hashed first when [`CopyOptions::verify_existing`] is set), a
///    larger destination is refused, a smaller one is overwritten.
/// 4. Stream the source into `<dst>.temp` one buffer at a time.
/// 5. Verify both MD5 digests, set atime/mtime to the source mtime, rename
///    into place.
///
/// Exactly one terminal observation is sent; `progress` is dropped on
/// return. If the receiver goes away mid-copy the copy is abandoned as
/// cancelled. A failed copy's temp file is handled per
/// [`CopyOptions::temp_policy`].
pub fn copy_file(
    src: FileRecord,
    dst: impl AsRef<Path>,
    options: &CopyOptions,
    progress: Sender<Progress>,
) {
    let dst = match normalize(dst.as_ref()) {
        Ok(dst) => dst,
        Err(error) => {
            let _ = progress.send(Progress::failed(dst.as_ref().to_path_buf(), 0, 0, error));
            return;
        }
    };

    let mut copy = FileCopy {
        dst: &dst,
        options,
        progress: &progress,
        total: 0,
        current: 0,
    };

    let terminal = match copy.run(src) {
        Ok(Outcome::Copied) => {
            options.verbose(&format!("copied {} ({} bytes)", dst.display(), copy.total));
            Progress::copied(dst.clone(), copy.total)
        }
        Ok(Outcome::Skipped) => {
            options.verbose(&format!("skipped {} (same size)", dst.display()));
            Progress::skipped(dst.clone(), copy.total)
        }
        Err(error) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(dst = %dst.display(), code = %error.code(), "copy failed");
            options.verbose(&format!("failed {}: {}", dst.display(), error));
            Progress::failed(dst.clone(), copy.total, copy.current, error)
        }
    };

    let _ = progress.send(terminal);
}

/// Start [`copy_file`] on a background thread and return its progress stream.
///
/// # Errors
///
/// Returns [`Error::Spawn`] if the thread cannot be started.
///
/// # Example
///
/// ```no_run
/// use checkcopy::{CopyOptions, FileRecord, spawn_copy_file};
///
/// let stream = spawn_copy_file(
///     FileRecord::new("photos/P1010022.JPG"),
///     "backup/P1010022.JPG",
///     &CopyOptions::default(),
/// )?;
/// for progress in stream {
///     println!("{} {}/{}", progress.path.display(), progress.current, progress.total);
/// }
/// # Ok::<(), checkcopy::Error>(())
/// ```
pub fn spawn_copy_file(
    src: FileRecord,
    dst: impl AsRef<Path>,
    options: &CopyOptions,
) -> Result<Receiver<Progress>> {
    let dst = dst.as_ref().to_path_buf();
    let spawn_path = dst.clone();
    let options = options.clone();
    let (progress, stream) = bounded(0);

    thread::Builder::new()
        .name("checkcopy-copy".into())
        .spawn(move || copy_file(src, &dst, &options, progress))
        .map_err(|source| Error::Spawn {
            path: spawn_path,
            source,
        })?;

    Ok(stream)
}

/// State of one in-flight copy.
struct FileCopy<'a> {
    dst: &'a Path,
    options: &'a CopyOptions,
    progress: &'a Sender<Progress>,
    total: u64,
    current: u64,
}

impl FileCopy<'_> {
    fn run(&mut self, src: FileRecord) -> Result<Outcome> {
        let FileRecord {
            path,
            metadata,
            error,
        } = src;
        if let Some(error) = error {
            return Err(error);
        }
        let src_path = normalize(&path)?;

        create_parent_dirs(self.dst).map_err(|source| Error::CreateFailed {
            path: self.dst.parent().unwrap_or(self.dst).to_path_buf(),
            source,
        })?;

        let src_meta = match metadata {
            Some(metadata) => metadata,
            None => fs::symlink_metadata(&src_path).map_err(|source| Error::StatFailed {
                path: src_path.clone(),
                source,
            })?,
        };
        if !src_meta.is_file() {
            return Err(Error::NotRegular(src_path));
        }
        self.total = src_meta.len();

        if let Some(outcome) = self.check_destination(&src_path)? {
            return Ok(outcome);
        }

        self.transfer(&src_path, &src_meta)
    }

    /// Decide what an existing destination means for this copy.
    ///
    /// `Some` ends the copy early, `None` proceeds with a fresh transfer.
    fn check_destination(&self, src_path: &Path) -> Result<Option<Outcome>> {
        let dst_meta = match fs::symlink_metadata(self.dst) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::DestinationOpen {
                    path: self.dst.to_path_buf(),
                    source,
                });
            }
        };

        if !dst_meta.is_file() {
            return Err(Error::DestinationNotFile(self.dst.to_path_buf()));
        }

        let dst_size = dst_meta.len();
        if dst_size > self.total {
            return Err(Error::DestinationLarger {
                path: self.dst.to_path_buf(),
                src_size: self.total,
                dst_size,
            });
        }
        if dst_size < self.total {
            return Ok(None);
        }

        if self.options.verify_existing {
            match verify_copy(src_path, self.dst) {
                Ok(()) => {}
                Err(Error::HashMismatch { .. }) => {
                    self.options.verbose(&format!(
                        "{} has the source size but different content, copying again",
                        self.dst.display()
                    ));
                    return Ok(None);
                }
                Err(error) => return Err(error),
            }
        }

        Ok(Some(Outcome::Skipped))
    }

    fn transfer(&mut self, src_path: &Path, src_meta: &Metadata) -> Result<Outcome> {
        let start = Instant::now();

        let source = File::open(src_path).map_err(|source| Error::ReadFailed {
            path: src_path.to_path_buf(),
            source,
        })?;
        // Bytes appended after the stat are not copied; the checksum catches it.
        let mut source = source.take(self.total);

        let temp_path = temp_path(self.dst);
        let mut temp = create_temp(self.dst, &temp_path, self.options)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            src = %src_path.display(),
            temp = %temp_path.display(),
            total = self.total,
            "transfer started"
        );

        let mut buffer = vec![0u8; self.options.buffer_size.max(1)];
        loop {
            if self.options.is_cancelled() {
                return Err(Error::Cancelled(self.dst.to_path_buf()));
            }

            let n = fill_buffer(&mut source, &mut buffer).map_err(|source| Error::ReadFailed {
                path: src_path.to_path_buf(),
                source,
            })?;
            if n == 0 {
                break;
            }

            temp.write_all(&buffer[..n])
                .map_err(|source| Error::WriteFailed {
                    path: temp_path.clone(),
                    source,
                })?;
            self.current += n as u64;

            let time_left = estimate_time_left(start.elapsed(), self.total, self.current);
            let observation =
                Progress::transferring(self.dst.to_path_buf(), self.total, self.current, time_left);
            if self.progress.send(observation).is_err() {
                return Err(Error::Cancelled(self.dst.to_path_buf()));
            }
        }
        drop(buffer);

        // The source shrank after it was stat'ed; report what was actually read.
        if self.current < self.total {
            self.total = self.current;
        }

        if self.options.fsync {
            temp.as_file()
                .sync_all()
                .map_err(|source| Error::WriteFailed {
                    path: temp_path.clone(),
                    source,
                })?;
        }
        let temp = temp.into_temp_path();

        verify_copy(src_path, &temp)?;

        if self.options.preserve_timestamps {
            preserve_timestamps(src_meta, &temp).map_err(|source| Error::ChtimesFailed {
                path: temp_path.clone(),
                source,
            })?;
        }

        temp.persist(self.dst).map_err(|e| Error::RenameFailed {
            from: temp_path,
            to: self.dst.to_path_buf(),
            source: e.error,
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            dst = %self.dst.display(),
            bytes = self.current,
            elapsed = ?start.elapsed(),
            "copy verified and published"
        );

        Ok(Outcome::Copied)
    }
}

/// Create `<dst>.temp` next to `dst`.
///
/// A temp file left behind by an earlier failed run is replaced. Under
/// [`TempPolicy::Remove`] the file is deleted when it is dropped without
/// being persisted.
fn create_temp(dst: &Path, temp_path: &Path, options: &CopyOptions) -> Result<NamedTempFile> {
    let create_failed = |source: io::Error| Error::CreateFailed {
        path: temp_path.to_path_buf(),
        source,
    };

    let parent = dst.parent().unwrap_or(Path::new("."));
    let name = dst.file_name().ok_or_else(|| {
        create_failed(io::Error::new(
            io::ErrorKind::InvalidInput,
            "destination has no file name",
        ))
    })?;

    let mut builder = tempfile::Builder::new();
    builder
        .prefix(name)
        .suffix(".temp")
        .rand_bytes(0)
        .disable_cleanup(options.temp_policy == TempPolicy::Retain);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // 0o666 so the process umask applies, like a plain create
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    match builder.tempfile_in(parent) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            options.warn(&format!("Replacing stale {}", temp_path.display()));
            fs::remove_file(temp_path).map_err(create_failed)?;
            builder.tempfile_in(parent).map_err(create_failed)
        }
        Err(source) => Err(create_failed(source)),
    }
}

// =============================================================================
// Tests
// =============================================================================
