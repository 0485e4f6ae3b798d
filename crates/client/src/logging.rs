use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initialize logging to stderr, leaving stdout to command output.
///
/// `RUST_LOG` overrides `level`. The returned guard must be kept alive for the
/// duration of the program, or buffered lines are lost.
pub fn init_logging(level: LevelFilter) -> WorkerGuard {
    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(stderr_writer)
        .with_filter(env_filter);

    // a second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();

    stderr_guard
}
