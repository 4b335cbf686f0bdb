use tracing::Subscriber;
use tracing_subscriber::{fmt, EnvFilter};

/// Builds the subscriber used by the command line tools: human readable
/// lines on standard output at `info` unless `RUST_LOG` says otherwise.
///
/// The subscriber is returned rather than installed globally; callers scope
/// it with `tracing::subscriber::with_default`.
pub fn stdout_subscriber() -> impl Subscriber + Send + Sync {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stdout)
        .finish()
}
