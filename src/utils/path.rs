//! Path normalization helpers.
//!
//! Every path crossing a component boundary is absolute and uses `/` as its
//! separator. On Unix that is what [`std::path::absolute`] already produces;
//! on Windows backslashes are rewritten to forward slashes as well.

use crate::error::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Make `path` absolute (without touching the filesystem) and normalize its
/// separators.
///
/// # Errors
///
/// Returns [`Error::PathResolution`] if the current directory is needed and
/// cannot be read, or if `path` is empty.
pub fn normalize(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|source| Error::PathResolution {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(to_slash(absolute))
}

#[cfg(windows)]
fn to_slash(path: PathBuf) -> PathBuf {
    PathBuf::from(path.to_string_lossy().replace('\\', "/"))
}

// Backslash is a legal filename byte on Unix and must survive unchanged.
#[cfg(not(windows))]
fn to_slash(path: PathBuf) -> PathBuf {
    path
}

/// Path of the temporary file a copy to `dst` is written to: `<dst>.temp`.
pub fn temp_path(dst: &Path) -> PathBuf {
    let mut name = OsString::from(dst.as_os_str());
    name.push(".temp");
    PathBuf::from(name)
}

/// Compose `<dir>/<name>` with a forward slash separator.
pub(crate) fn child(dir: &Path, name: &OsStr) -> PathBuf {
    let mut joined = OsString::from(dir.as_os_str());
    if !dir.as_os_str().as_encoded_bytes().ends_with(b"/") {
        joined.push("/");
    }
    joined.push(name);
    PathBuf::from(joined)
}

/// Map `path`, located under `src_root`, to the same relative location under
/// `dst_root`.
///
/// Returns `None` when `path` is not inside `src_root`.
pub fn rebase(path: &Path, src_root: &Path, dst_root: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(src_root).ok()?;
    if relative.as_os_str().is_empty() {
        Some(dst_root.to_path_buf())
    } else {
        Some(to_slash(dst_root.join(relative)))
    }
}
