//! checkcopy - Verified Copy
//!
//! Copies a directory tree file by file, checking every copy against its
//! source before it is renamed into place. Built on the checkcopy library.

use checkcopy::{
    CopyOptions, CopyStats, DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_SIZE, Error as CheckcopyError,
    Progress, TempPolicy, create_progress_bar, spawn_copy_dir, update_progress_bar,
};
use clap::Parser;
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// checkcopy - Verified recursive copy
///
/// Copies every file under SRC to the same relative path under DST. Each
/// file is written to `<name>.temp`, compared by MD5 with its source, given
/// the source's modification time and only then renamed into place.
/// Destination files that already have the source's size are skipped, so an
/// interrupted run is resumed by running it again.
///
/// Successful observations are logged to `<result-dir>/ok.txt`, errors to
/// `<result-dir>/error.txt`; both are echoed to stdout.
#[derive(Parser, Debug)]
#[command(name = "checkcopy", version, about, long_about = None, args_override_self = true)]
struct Args {
    /// Source directory to copy (also accepted as -src)
    #[arg(long, value_name = "PATH", default_value = "test/data/source")]
    src: PathBuf,

    /// Destination directory to copy to (also accepted as -dst)
    #[arg(long, value_name = "PATH", default_value = "test/data/target")]
    dst: PathBuf,

    /// Directory receiving ok.txt and error.txt
    #[arg(long, value_name = "DIR", default_value = "result")]
    result_dir: PathBuf,

    /// Copy buffer size in bytes; one progress line per filled buffer
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Directory entries read per batch
    #[arg(long, value_name = "N", default_value_t = DEFAULT_BATCH_SIZE)]
    batch: usize,

    /// Hash same-size destination files instead of trusting their size
    #[arg(long)]
    verify_existing: bool,

    /// Keep <name>.temp when a copy fails
    #[arg(long)]
    keep_failed_temp: bool,

    /// Do not call fsync before verifying each file (faster but less safe)
    #[arg(long)]
    no_sync: bool,

    /// Do not copy file modification times
    #[arg(long)]
    no_times: bool,

    /// Do not echo log lines to stdout
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Show a progress bar on stderr
    #[arg(long)]
    progress: bool,

    /// Verbose output (debug logging on stderr)
    #[arg(short = 'v', long)]
    verbose: bool,
}

type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to create result directory {path}: {source}")]
    ResultDirectory { path: PathBuf, source: io::Error },

    #[error("Failed to open log file {path}: {source}")]
    OpenLog { path: PathBuf, source: io::Error },

    #[error("Failed to write log file {path}: {source}")]
    WriteLog { path: PathBuf, source: io::Error },

    #[error("Failed to start copy: {source}")]
    Start { source: CheckcopyError },

    #[error("Cancelled")]
    Cancelled { stats: CopyStats },
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled { .. } => 130,
            _ => 1,
        }
    }
}

fn main() {
    let args = Args::parse_from(go_style_flags(std::env::args_os()));
    init_tracing(args.verbose);

    if let Err(error) = run(&args) {
        if let CliError::Cancelled { stats } = &error {
            eprintln!(
                "Cancelled after copying {} files ({}).",
                stats.files_copied,
                format_bytes(stats.bytes_copied)
            );
            eprintln!("Re-run with the same command to resume.");
        } else {
            println!("Error \"{error}\"");
        }
        std::process::exit(error.exit_code());
    }
}

/// Accept the single-dash long flags `-src` and `-dst` by rewriting them to
/// their `--` form before clap sees them.
fn go_style_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            for flag in ["-src", "-dst"] {
                let matches = text
                    .strip_prefix(flag)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('='));
                if matches {
                    return OsString::from(format!("-{text}"));
                }
            }
            arg
        })
        .collect()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_options(args: &Args) -> CopyOptions {
    let mut options = CopyOptions::default()
        .with_buffer_size(args.buffer_size)
        .with_batch_size(args.batch);
    if args.verify_existing {
        options = options.with_verify_existing();
    }
    if args.keep_failed_temp {
        options = options.with_temp_policy(TempPolicy::Retain);
    }
    if args.no_sync {
        options = options.without_fsync();
    }
    if args.no_times {
        options = options.without_timestamps();
    }
    options
}

fn run(args: &Args) -> CliResult<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel_clone = cancel.clone();
        ctrlc::set_handler(move || {
            if cancel_clone.load(Ordering::Relaxed) {
                eprintln!("\nForce quit.");
                std::process::exit(130);
            }
            cancel_clone.store(true, Ordering::Relaxed);
            eprintln!(
                "\nCancelling... the file in flight is abandoned. Press Ctrl+C again to abort immediately."
            );
        })
        .ok();
    }
    let options = build_options(args).with_cancel_token(cancel);

    let mut logs = ResultLogs::create(&args.result_dir)?;

    tracing::debug!(
        src = %args.src.display(),
        dst = %args.dst.display(),
        buffer_size = options.buffer_size,
        batch = options.batch_size,
        "starting copy"
    );

    let stream = spawn_copy_dir(&args.src, &args.dst, &options)
        .map_err(|source| CliError::Start { source })?;

    let pb = args.progress.then(create_progress_bar);
    let mut stats = CopyStats::default();
    let mut failures = FailureCodes::new();
    let mut cancelled = false;

    for progress in stream {
        stats.record(&progress);
        if let Some(pb) = &pb {
            update_progress_bar(pb, &progress);
        }

        let line = log_line(&progress);
        match &progress.error {
            Some(error) => {
                if error.is_cancelled() {
                    cancelled = true;
                } else {
                    *failures.entry(error.code().as_str()).or_default() += 1;
                }
                logs.write_error(&line)?;
            }
            None => logs.write_ok(&line)?,
        }

        if !args.quiet {
            echo(pb.as_ref(), &line);
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    logs.finish()?;

    if cancelled {
        return Err(CliError::Cancelled { stats });
    }
    if !args.quiet {
        print_stats(&stats, &failures);
    }
    Ok(())
}

/// Failure counts keyed by [`checkcopy::ErrorCode`] name.
type FailureCodes = BTreeMap<&'static str, usize>;

/// The log line for one observation: `<path> sec <seconds>` on success,
/// `Error "<message>"` on failure.
fn log_line(progress: &Progress) -> String {
    match &progress.error {
        Some(error) => format!("Error \"{error}\""),
        None => format!(
            "{} sec {}",
            progress.path.display(),
            format_seconds(progress.time_left)
        ),
    }
}

fn format_seconds(duration: Duration) -> String {
    if duration.is_zero() {
        "0".to_string()
    } else {
        format!("{:.3}", duration.as_secs_f64())
    }
}

fn echo(pb: Option<&ProgressBar>, line: &str) {
    match pb {
        Some(pb) => pb.suspend(|| println!("{line}")),
        None => println!("{line}"),
    }
}

/// `ok.txt` and `error.txt`, truncated at start.
struct ResultLogs {
    ok_path: PathBuf,
    ok: BufWriter<File>,
    error_path: PathBuf,
    error: BufWriter<File>,
}

impl ResultLogs {
    fn create(dir: &Path) -> CliResult<Self> {
        fs::create_dir_all(dir).map_err(|source| CliError::ResultDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let error_path = dir.join("error.txt");
        let error = open_log(&error_path)?;
        let ok_path = dir.join("ok.txt");
        let ok = open_log(&ok_path)?;

        Ok(Self {
            ok_path,
            ok,
            error_path,
            error,
        })
    }

    fn write_ok(&mut self, line: &str) -> CliResult<()> {
        writeln!(self.ok, "{line}").map_err(|source| CliError::WriteLog {
            path: self.ok_path.clone(),
            source,
        })
    }

    fn write_error(&mut self, line: &str) -> CliResult<()> {
        writeln!(self.error, "{line}").map_err(|source| CliError::WriteLog {
            path: self.error_path.clone(),
            source,
        })
    }

    fn finish(&mut self) -> CliResult<()> {
        self.ok.flush().map_err(|source| CliError::WriteLog {
            path: self.ok_path.clone(),
            source,
        })?;
        self.error.flush().map_err(|source| CliError::WriteLog {
            path: self.error_path.clone(),
            source,
        })
    }
}

fn open_log(path: &Path) -> CliResult<BufWriter<File>> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o755);
    }
    options
        .open(path)
        .map(BufWriter::new)
        .map_err(|source| CliError::OpenLog {
            path: path.to_path_buf(),
            source,
        })
}

fn print_stats(stats: &CopyStats, failures: &FailureCodes) {
    let mut parts = vec![format!(
        "{} files copied ({})",
        stats.files_copied,
        format_bytes(stats.bytes_copied)
    )];
    if stats.files_skipped > 0 {
        parts.push(format!("{} skipped", stats.files_skipped));
    }
    if stats.files_failed > 0 {
        parts.push(format!(
            "{} failed ({})",
            stats.files_failed,
            format_failures(failures)
        ));
    }
    eprintln!("{}", parts.join(", "));
}

fn format_failures(failures: &FailureCodes) -> String {
    failures
        .iter()
        .map(|(code, count)| format!("{code}: {count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
