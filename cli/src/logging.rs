//! Tracing setup for the binary. Logs go to stderr (never stdout, which carries the reply or
//! JSON events), or to a file when `--log-file` is given.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::log_format::ScopedText;

/// Default filter when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("warn,ragent=debug,cli=debug")
    } else {
        EnvFilter::new("warn")
    }
}

/// Installs the global subscriber. Keep the returned guard alive until exit so buffered
/// file output is flushed.
pub fn init(
    verbose: bool,
    log_file: Option<&Path>,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));
    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let dir = dir.unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| format!("--log-file {} has no file name", path.display()))?;
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .event_format(ScopedText::new())
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_filter(filter),
                )
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .event_format(ScopedText::new())
                        .with_writer(std::io::stderr)
                        .with_filter(filter),
                )
                .try_init()?;
            Ok(None)
        }
    }
}
