//! Core copy operations.
//!
//! This module provides the verified single-file copier, the directory
//! driver that feeds it from the walker, and the progress observations both
//! of them emit.

mod checksum;
mod dir;
mod file;
mod observation;
mod utils;

// Re-export public API
pub use checksum::{checksum, verify_copy};
pub use dir::{CopyStats, copy_dir, spawn_copy_dir};
pub use file::{copy_file, spawn_copy_file};
pub use observation::{Progress, Stage};
