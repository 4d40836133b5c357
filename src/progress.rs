//! Progress bar rendering (requires `progress` feature)

use crate::copy::{Progress, Stage};
use indicatif::{ProgressBar, ProgressStyle};

/// Create a byte-oriented progress bar for one file at a time.
///
/// The length is set from each file's first observation by
/// [`update_progress_bar`].
#[must_use]
pub fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec} ({eta}) {wide_msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb
}

/// Render one observation on `pb`.
///
/// The bar tracks the file the observation belongs to; terminal observations
/// fill it and leave the outcome in the message.
pub fn update_progress_bar(pb: &ProgressBar, progress: &Progress) {
    let name = progress
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    pb.set_length(progress.total);
    pb.set_position(progress.current);
    match progress.stage {
        Stage::Transferring => pb.set_message(name),
        Stage::Copied => pb.set_message(format!("{name} copied")),
        Stage::Skipped => pb.set_message(format!("{name} skipped")),
        Stage::Failed => pb.set_message(format!("{name} failed")),
    }
}
