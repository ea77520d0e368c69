use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_DIRECTIVES: &str = "info,blog_api=debug";

/// JSON lines on stdout, filtered by `RUST_LOG` when set.
///
/// `try_init` also installs the `log` bridge, so actix's access log lands in the
/// same stream. A second call (tests building several apps) is a no-op.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let _ = fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .with_span_list(false)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}
