use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize structured JSON logging on stderr.
///
/// Defaults to `error` level unless overridden by `QUIETCUT_LOG`. `default_level` can widen
/// that default (e.g. to `warn` when recoverable warnings should be echoed); an explicit
/// `QUIETCUT_LOG` still wins.
pub fn init(default_level: tracing::level_filters::LevelFilter) {
    let default = default_level.max(tracing::level_filters::LevelFilter::ERROR);
    let filter = EnvFilter::builder()
        .with_env_var("QUIETCUT_LOG")
        .with_default_directive(default.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn init_is_idempotent() {
        init(LevelFilter::ERROR);
        init(LevelFilter::WARN);
    }
}
