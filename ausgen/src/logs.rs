//! Pipeline log vocabulary on top of `tracing`.
//!
//! Steps report progress through `log_info` / `log_success` / `log_warning` /
//! `log_error`; each becomes a `tracing` event carrying a `status` field so a
//! subscriber can tell a success from a plain info line.

use tracing_subscriber::{fmt, EnvFilter};

/// Status attached to a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) {
    let default = if verbose { "ausgen=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn log(level: LogLevel, msg: impl Into<String>) {
    let message = msg.into();
    let status = level.as_str();
    match level {
        LogLevel::Info | LogLevel::Success => tracing::info!(status, "{}", message),
        LogLevel::Warning => tracing::warn!(status, "{}", message),
        LogLevel::Error => tracing::error!(status, "{}", message),
    }
}

pub fn log_info(msg: impl Into<String>) {
    log(LogLevel::Info, msg);
}

pub fn log_success(msg: impl Into<String>) {
    log(LogLevel::Success, msg);
}

pub fn log_warning(msg: impl Into<String>) {
    log(LogLevel::Warning, msg);
}

pub fn log_error(msg: impl Into<String>) {
    log(LogLevel::Error, msg);
}
