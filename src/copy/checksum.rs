//! MD5 content hashing used to verify copies.
//!
//! MD5 is used for speed on single-host verification; it is not a security
//! property.

use crate::error::{Error, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io;
use std::path::Path;

/// Stream `path` through MD5 and return the digest as 32 lowercase hex chars.
///
/// # Example
///
/// ```no_run
/// let digest = checkcopy::checksum(std::path::Path::new("file1.txt"))?;
/// assert_eq!(digest.len(), 32);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn checksum(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Check that `dst` has the same MD5 digest as `src`.
///
/// Both files are hashed concurrently.
///
/// # Errors
///
/// - [`Error::ChecksumSrc`] / [`Error::ChecksumDst`] if either file cannot be read
/// - [`Error::HashMismatch`] if the digests differ
pub fn verify_copy(src: &Path, dst: &Path) -> Result<()> {
    let (src_digest, dst_digest) = rayon::join(|| checksum(src), || checksum(dst));

    let src_digest = src_digest.map_err(|source| Error::ChecksumSrc {
        path: src.to_path_buf(),
        source,
    })?;
    let dst_digest = dst_digest.map_err(|source| Error::ChecksumDst {
        path: dst.to_path_buf(),
        source,
    })?;

    if src_digest != dst_digest {
        return Err(Error::HashMismatch {
            path: dst.to_path_buf(),
            src_digest,
            dst_digest,
        });
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(
        src = %src.display(),
        dst = %dst.display(),
        digest = %src_digest,
        "checksums match"
    );

    Ok(())
}
