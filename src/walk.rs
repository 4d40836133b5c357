//! Lazy recursive enumeration of regular files.
//!
//! The walker sends one [`FileRecord`] per file over a rendezvous channel, so
//! it can never run ahead of its consumer. Directories are traversed but not
//! emitted. Each subdirectory is walked by a nested scoped thread with its own
//! channel, which the parent drains completely before moving on to its next
//! entry; the result is subtree depth-first order with at most
//! [`CopyOptions::batch_size`] names buffered per open directory level.
//!
//! Failures are records, not return values: an unreadable entry becomes a
//! record with [`FileRecord::error`] set and its siblings are still visited.

use crate::error::{Error, Result};
use crate::options::CopyOptions;
use crate::utils::path::{child, normalize};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

/// One enumerated filesystem entry.
///
/// A record carries either usable metadata or an error. Records built by
/// hand with [`FileRecord::new`] carry neither; the copier reads the
/// metadata itself in that case.
#[derive(Debug)]
pub struct FileRecord {
    /// Absolute, slash-normalized path
    pub path: PathBuf,
    /// Metadata snapshot taken without following symlinks
    pub metadata: Option<Metadata>,
    /// Why this entry could not be enumerated
    pub error: Option<Error>,
}

impl FileRecord {
    /// A record for `path` with no metadata yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metadata: None,
            error: None,
        }
    }

    pub(crate) fn found(path: PathBuf, metadata: Metadata) -> Self {
        Self {
            path,
            metadata: Some(metadata),
            error: None,
        }
    }

    pub(crate) fn failed(path: PathBuf, error: Error) -> Self {
        Self {
            path,
            metadata: None,
            error: Some(error),
        }
    }
}

/// Enumerate every file under `root`, sending one record per file to
/// `records`.
///
/// Blocks until the tree is exhausted, the receiver is dropped, or the
/// cancellation token in `options` is raised. `records` is dropped on
/// return, which closes the stream.
///
/// Entries that are neither directories nor regular files (symlinks,
/// devices, sockets, fifos) are emitted with their metadata and rejected
/// later by the copier.
pub fn walk(root: &Path, records: Sender<FileRecord>, options: &CopyOptions) {
    let root = match normalize(root) {
        Ok(root) => root,
        Err(error) => {
            let _ = records.send(FileRecord::failed(root.to_path_buf(), error));
            return;
        }
    };
    walk_dir(&root, &records, options);
}

/// Start [`walk`] on a background thread and return the receiving end of its
/// stream.
///
/// # Errors
///
/// Returns [`Error::Spawn`] if the walker thread cannot be started.
///
/// # Example
///
/// ```no_run
/// use checkcopy::{CopyOptions, walk_files};
///
/// for record in walk_files("photos", &CopyOptions::default())? {
///     match record.error {
///         Some(error) => eprintln!("{}", error),
///         None => println!("{}", record.path.display()),
///     }
/// }
/// # Ok::<(), checkcopy::Error>(())
/// ```
pub fn walk_files(root: impl AsRef<Path>, options: &CopyOptions) -> Result<Receiver<FileRecord>> {
    let root = root.as_ref().to_path_buf();
    let spawn_path = root.clone();
    let options = options.clone();
    let (records, stream) = bounded(0);

    thread::Builder::new()
        .name("checkcopy-walk".into())
        .spawn(move || walk(&root, records, &options))
        .map_err(|source| Error::Spawn {
            path: spawn_path,
            source,
        })?;

    Ok(stream)
}

/// Walk one directory level. Returns `false` once the consumer is gone or the
/// walk was cancelled, so callers stop as well.
fn walk_dir(dir: &Path, records: &Sender<FileRecord>, options: &CopyOptions) -> bool {
    let mut entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => return send_dir_error(dir, source, records),
    };

    #[cfg(feature = "tracing")]
    tracing::trace!(dir = %dir.display(), "walking directory");

    // An empty batch means the listing is exhausted, so never ask for zero.
    let batch_size = options.batch_size.max(1);
    let mut names: Vec<OsString> = Vec::with_capacity(batch_size);
    loop {
        let mut read_error = None;
        for entry in entries.by_ref().take(batch_size) {
            match entry {
                Ok(entry) => names.push(entry.file_name()),
                Err(source) => {
                    read_error = Some(source);
                    break;
                }
            }
        }

        if names.is_empty() && read_error.is_none() {
            return true;
        }

        for name in names.drain(..) {
            if options.is_cancelled() {
                return false;
            }
            if !visit(child(dir, &name), records, options) {
                return false;
            }
        }

        if let Some(source) = read_error {
            return send_dir_error(dir, source, records);
        }
    }
}

fn visit(path: PathBuf, records: &Sender<FileRecord>, options: &CopyOptions) -> bool {
    let record = match fs::symlink_metadata(&path) {
        Ok(metadata) if metadata.is_dir() => return walk_nested(&path, records, options),
        Ok(metadata) => FileRecord::found(path, metadata),
        Err(source) => FileRecord::failed(
            path.clone(),
            Error::StatFailed {
                path: path.clone(),
                source,
            },
        ),
    };
    records.send(record).is_ok()
}

/// Walk `dir` on a nested thread and forward its records in order.
fn walk_nested(dir: &Path, records: &Sender<FileRecord>, options: &CopyOptions) -> bool {
    thread::scope(|scope| {
        let (nested, stream) = bounded(0);
        let spawned = thread::Builder::new()
            .name("checkcopy-walk".into())
            .spawn_scoped(scope, move || walk_dir(dir, &nested, options));

        match spawned {
            Ok(_) => {
                for record in stream {
                    if records.send(record).is_err() {
                        return false;
                    }
                }
                true
            }
            Err(_error) => {
                options.warn(&format!(
                    "Failed to start walker thread for {}, walking inline",
                    dir.display()
                ));
                walk_dir(dir, records, options)
            }
        }
    })
}

fn send_dir_error(dir: &Path, source: io::Error, records: &Sender<FileRecord>) -> bool {
    let error = Error::DirectoryIo {
        path: dir.to_path_buf(),
        source,
    };
    records
        .send(FileRecord::failed(dir.to_path_buf(), error))
        .is_ok()
}
