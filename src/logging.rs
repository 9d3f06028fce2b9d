use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Initialise logging. Without `debug` the level is forced to `info`; with it
/// the level defaults to `debug` and can be overridden via `RUST_LOG`.
///
/// When `log_file` is given, output is written there as well as to stderr.
/// Calling this more than once is harmless; only the first call installs a
/// subscriber.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let file = log_file.as_deref().and_then(|path| {
        let name = path.file_name()?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        if let Err(err) = std::fs::create_dir_all(dir) {
            eprintln!("cannot create log directory {}: {err}", dir.display());
            return None;
        }
        Some(tracing_appender::rolling::never(dir, name))
    });

    let _ = match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::io::stderr.and(file))
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
}
