//! CLI logging setup
//!
//! Per-component log control built on `tracing-subscriber`.

use std::io;

use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::config::LogConfig;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Colored multi-line output for development.
    Pretty,
    /// Single-line output.
    Compact,
    /// JSON output for tool integration.
    Json,
}

/// Initialize the logging system with the given format and per-target
/// levels. Diagnostics go to stderr so stdout stays clean for record
/// output; `file` additionally appends them to a log file.
pub fn init_with_file<P: AsRef<std::path::Path>>(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<P>,
) {
    let targets = Targets::new()
        .with_default(log_config.global)
        .with_target("recscan::cursor", log_config.level_for("recscan::cursor"))
        .with_target("recscan::driver", log_config.level_for("recscan::driver"))
        .with_target("recscan::channel", log_config.level_for("recscan::channel"))
        .with_target("recscan::cli", log_config.global);

    if let Some(path) = file {
        let file_handle = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("Failed to open log file");

        let stderr_layer = create_format_layer(format, io::stderr).with_filter(targets.clone());
        let file_layer = fmt::layer()
            .with_writer(move || file_handle.try_clone().expect("Failed to clone file handle"))
            .with_filter(targets);

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        let stderr_layer = create_format_layer(format, io::stderr).with_filter(targets);
        tracing_subscriber::registry().with(stderr_layer).init();
    }
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> impl Layer<tracing_subscriber::Registry>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
