//! # checkcopy
//!
//! Verified, resumable recursive directory copying for Rust.
//!
//! ## Core Features
//!
//! - **Verified copies**: Every file is MD5-checked against its source before it appears at its final path
//! - **Atomic publish**: Content goes to `<dst>.temp` and is renamed into place only after verification
//! - **Resumable**: A destination that already has the source's size is skipped, so an interrupted run can simply be restarted
//! - **Streaming**: Files are enumerated lazily over rendezvous channels; memory stays bounded on huge trees
//! - **Progress as data**: Every chunk and every outcome is a [`Progress`] observation on a channel
//! - **Timestamp preserving**: The source modification time is copied onto each file
//!
//! ## Quick Start with Builder API
//!
//! ```no_run
//! use checkcopy::CopyBuilder;
//!
//! let stats = CopyBuilder::new("photos", "backup").run()?;
//! println!("Copied {} files ({} bytes)", stats.files_copied, stats.bytes_copied);
//! # Ok::<(), checkcopy::Error>(())
//! ```
//!
//! ## Streaming API
//!
//! The pipeline is `walk -> copy_file (per file) -> caller`, each stage
//! connected by a [`crossbeam_channel`] rendezvous channel:
//!
//! ```no_run
//! use checkcopy::{CopyOptions, Stage, spawn_copy_dir};
//!
//! let options = CopyOptions::default()
//!     .with_buffer_size(8 * 1024 * 1024)
//!     .with_batch_size(32);
//!
//! for progress in spawn_copy_dir("photos", "backup", &options)? {
//!     match (&progress.error, progress.stage) {
//!         (Some(error), _) => eprintln!("Error {:?}", error.to_string()),
//!         (None, Stage::Transferring) => {}
//!         (None, _) => println!("{} done", progress.path.display()),
//!     }
//! }
//! # Ok::<(), checkcopy::Error>(())
//! ```
//!
//! ## Safety Guarantees
//!
//! ### Verify Before Publish
//!
//! A destination file is never observable at its final path until its
//! content hash matches the source's. Failed copies leave the final path
//! untouched and their temporary file is removed, or kept with
//! [`TempPolicy::Retain`].
//!
//! ### No Overwrite of Larger Files
//!
//! A destination larger than its source is reported as
//! [`Error::DestinationLarger`] and left alone; a smaller one is replaced.
//!
//! ### Symlinks
//!
//! Symlinks are never followed. They are reported as
//! [`Error::NotRegular`] and not copied.
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `progress` | Progress bar rendering with indicatif |
//! | `tracing` | Structured logging with tracing crate |
//! | `serde` | Serialize/Deserialize for [`CopyOptions`] and [`Stage`] |
//! | `full` | Enable all optional features |

#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod copy;
mod error;
mod options;
mod utils;
mod walk;

#[cfg(feature = "progress")]
mod progress;

#[cfg(test)]
mod testutil;

pub use builder::CopyBuilder;
pub use copy::{
    CopyStats, Progress, Stage, checksum, copy_dir, copy_file, spawn_copy_dir, spawn_copy_file,
    verify_copy,
};
pub use error::{Error, ErrorCode, Result, is_no_space_error};
pub use options::{CopyOptions, DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_SIZE, TempPolicy};
pub use utils::path::{normalize, rebase, temp_path};
pub use walk::{FileRecord, walk, walk_files};

#[cfg(feature = "progress")]
#[cfg_attr(docsrs, doc(cfg(feature = "progress")))]
pub use progress::{create_progress_bar, update_progress_bar};
