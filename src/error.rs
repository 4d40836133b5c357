//! Error types for checkcopy.
//!
//! This module provides the [`Error`] enum containing every failure that can
//! be attached to a [`FileRecord`](crate::FileRecord) or a
//! [`Progress`](crate::Progress) observation, the stable [`ErrorCode`]
//! classification, and the [`Result`] type alias.
//!
//! Errors in checkcopy are data: the walker, the copier and the directory
//! driver send them down their channels instead of returning them, so a
//! failure on one file never stops its siblings.
//!
//! # Error Categories
//!
//! | Category | Errors |
//! |----------|--------|
//! | Paths | [`Error::PathResolution`], [`Error::DirectoryIo`], [`Error::StatFailed`] |
//! | Preconditions | [`Error::NotRegular`], [`Error::DestinationLarger`], [`Error::DestinationOpen`], [`Error::DestinationNotFile`] |
//! | Transfer | [`Error::CreateFailed`], [`Error::ReadFailed`], [`Error::WriteFailed`] |
//! | Verification | [`Error::ChecksumSrc`], [`Error::ChecksumDst`], [`Error::HashMismatch`] |
//! | Publish | [`Error::ChtimesFailed`], [`Error::RenameFailed`] |
//! | Control | [`Error::Spawn`], [`Error::Cancelled`], [`Error::PartialCopy`] |

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for checkcopy operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Check if an IO error indicates "no space left on device".
///
/// # Platform Support
///
/// | Platform | Error Detection |
/// |----------|-----------------|
/// | Unix | `ENOSPC` (errno 28) |
/// | Windows | `ERROR_DISK_FULL` (0x70) |
///
/// # Example
///
/// ```
/// use std::io;
/// use checkcopy::is_no_space_error;
///
/// let error = io::Error::new(io::ErrorKind::StorageFull, "disk full");
/// assert!(is_no_space_error(&error));
/// ```
pub fn is_no_space_error(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::StorageFull {
        return true;
    }

    #[cfg(unix)]
    {
        // The raw OS error might be available even if kind() isn't StorageFull
        if let Some(raw_error) = error.raw_os_error() {
            const ENOSPC: i32 = 28;
            return raw_error == ENOSPC;
        }
    }

    #[cfg(windows)]
    {
        if let Some(raw_error) = error.raw_os_error() {
            const ERROR_DISK_FULL: i32 = 112;
            return raw_error == ERROR_DISK_FULL;
        }
    }

    false
}

/// Errors that can be attached to a record or an observation.
///
/// All variants carry the path they refer to.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A path could not be made absolute
    #[error("Can't get absolute path of {path}: {source}")]
    PathResolution {
        /// The path as given
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Opening or listing a directory failed
    #[error("Failed to read directory {path}: {source}")]
    DirectoryIo {
        /// Directory being listed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Reading metadata for a path failed
    #[error("Can't stat {path}: {source}")]
    StatFailed {
        /// Path whose metadata was requested
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Source exists but is not a regular file
    #[error("{0} is not a regular file")]
    NotRegular(PathBuf),

    /// Destination already holds more bytes than the source
    #[error("target file \"{path}\" is larger ({dst_size} > {src_size} bytes)")]
    DestinationLarger {
        /// Destination path
        path: PathBuf,
        /// Size of the source file
        src_size: u64,
        /// Size of the existing destination file
        dst_size: u64,
    },

    /// Destination exists but its metadata could not be read
    #[error("Can't open file {path}: {source}")]
    DestinationOpen {
        /// Destination path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Destination exists and is not a regular file
    #[error("target \"{0}\" exists and is not a regular file")]
    DestinationNotFile(PathBuf),

    /// Creating the temporary file or its parent directories failed
    #[error("create failed for {path}: {source}")]
    CreateFailed {
        /// Path that could not be created
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Reading the source failed mid-stream
    #[error("read failed on {path}: {source}")]
    ReadFailed {
        /// Source path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Writing the temporary file failed mid-stream
    #[error("write failed on {path}: {source}")]
    WriteFailed {
        /// Temporary file path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Hashing the source for verification failed
    #[error("checkcopy src {path}: {source}")]
    ChecksumSrc {
        /// Source path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Hashing the written copy for verification failed
    #[error("checkcopy dst {path}: {source}")]
    ChecksumDst {
        /// Temporary file path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Source and copy digests differ
    #[error("Source and destination don't match checksum for {path} ({src_digest} != {dst_digest})")]
    HashMismatch {
        /// Destination path
        path: PathBuf,
        /// MD5 of the source
        src_digest: String,
        /// MD5 of the written copy
        dst_digest: String,
    },

    /// Setting access/modification times on the copy failed
    #[error("Failed to set times on {path}: {source}")]
    ChtimesFailed {
        /// Temporary file path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Renaming the verified temporary file into place failed
    #[error("Failed to rename {from} to {to}: {source}")]
    RenameFailed {
        /// Temporary file path
        from: PathBuf,
        /// Final destination path
        to: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// A worker thread could not be started
    #[error("Failed to start worker for {path}: {source}")]
    Spawn {
        /// Path the worker would have handled
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Operation was cancelled via cancellation token or a closed observer
    #[error("Operation cancelled at {0}")]
    Cancelled(PathBuf),

    /// One or more files failed during a [`CopyBuilder`](crate::CopyBuilder) run
    #[error("Failed to copy {failed} of {total} files")]
    PartialCopy {
        /// Number of files that failed
        failed: u64,
        /// Number of files attempted
        total: u64,
    },
}

/// Stable, machine-readable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    PathResolution,
    DirectoryIo,
    StatFailed,
    NotRegular,
    DestinationLarger,
    DestinationOpen,
    CreateFailed,
    ReadFailed,
    WriteFailed,
    ChecksumSrc,
    ChecksumDst,
    HashMismatch,
    ChtimesFailed,
    RenameFailed,
    NoSpace,
    Cancelled,
    PartialCopy,
    Internal,
}

impl ErrorCode {
    /// Snake-case name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PathResolution => "path_resolution",
            Self::DirectoryIo => "directory_io",
            Self::StatFailed => "stat_failed",
            Self::NotRegular => "not_regular",
            Self::DestinationLarger => "destination_larger",
            Self::DestinationOpen => "destination_open",
            Self::CreateFailed => "create_failed",
            Self::ReadFailed => "read_failed",
            Self::WriteFailed => "write_failed",
            Self::ChecksumSrc => "checksum_src",
            Self::ChecksumDst => "checksum_dst",
            Self::HashMismatch => "hash_mismatch",
            Self::ChtimesFailed => "chtimes_failed",
            Self::RenameFailed => "rename_failed",
            Self::NoSpace => "no_space",
            Self::Cancelled => "cancelled",
            Self::PartialCopy => "partial_copy",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classify this error.
    ///
    /// Storage-full failures while creating or writing the copy are reported
    /// as [`ErrorCode::NoSpace`] regardless of the step that hit them.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PathResolution { .. } => ErrorCode::PathResolution,
            Self::DirectoryIo { .. } => ErrorCode::DirectoryIo,
            Self::StatFailed { .. } => ErrorCode::StatFailed,
            Self::NotRegular(_) => ErrorCode::NotRegular,
            Self::DestinationLarger { .. } => ErrorCode::DestinationLarger,
            Self::DestinationOpen { .. } | Self::DestinationNotFile(_) => {
                ErrorCode::DestinationOpen
            }
            Self::CreateFailed { source, .. } if is_no_space_error(source) => ErrorCode::NoSpace,
            Self::WriteFailed { source, .. } if is_no_space_error(source) => ErrorCode::NoSpace,
            Self::CreateFailed { .. } => ErrorCode::CreateFailed,
            Self::ReadFailed { .. } => ErrorCode::ReadFailed,
            Self::WriteFailed { .. } => ErrorCode::WriteFailed,
            Self::ChecksumSrc { .. } => ErrorCode::ChecksumSrc,
            Self::ChecksumDst { .. } => ErrorCode::ChecksumDst,
            Self::HashMismatch { .. } => ErrorCode::HashMismatch,
            Self::ChtimesFailed { .. } => ErrorCode::ChtimesFailed,
            Self::RenameFailed { .. } => ErrorCode::RenameFailed,
            Self::Spawn { .. } => ErrorCode::Internal,
            Self::Cancelled(_) => ErrorCode::Cancelled,
            Self::PartialCopy { .. } => ErrorCode::PartialCopy,
        }
    }

    /// Whether this error reports a cancelled operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
