//! Utility functions for file copy operations.
//!
//! Buffer filling, parent directory creation and timestamp handling used by
//! the single-file copier.

use filetime::{FileTime, set_file_times};
use std::fs::{self, Metadata};
use std::io::{self, Read};
use std::path::Path;

// =============================================================================
// File content copying
// =============================================================================

/// Read from `reader` until `buf` is full or the end of input is reached.
///
/// Returns the number of bytes placed in `buf`; 0 means end of input. Short
/// reads are retried so every chunk except the last is exactly `buf.len()`.
pub(crate) fn fill_buffer(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// =============================================================================
// Directory utilities
// =============================================================================

/// Create the missing ancestors of `path` with mode `0755`.
///
/// Directory timestamps are left alone; adding the file changes them anyway.
pub(crate) fn create_parent_dirs(path: &Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(parent)
}

// =============================================================================
// Metadata and timestamp utilities
// =============================================================================

/// Set both atime and mtime of `dst` to the modification time in `src_meta`.
pub(crate) fn preserve_timestamps(src_meta: &Metadata, dst: &Path) -> io::Result<()> {
    let mtime = FileTime::from_last_modification_time(src_meta);
    set_file_times(dst, mtime, mtime)
}

// =============================================================================
// Tests
// =============================================================================
