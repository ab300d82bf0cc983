use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,tower_http=info";

fn filter() -> EnvFilter {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    EnvFilter::new(directives)
}

pub fn init() {
    tracing_subscriber::fmt().with_env_filter(filter()).with_ansi(false).init();
}

/// Test-harness variant: output goes through the captured test writer and a
/// second call is a no-op.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_ansi(false)
        .with_test_writer()
        .try_init();
}
