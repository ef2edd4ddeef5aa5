use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` is honoured only when debug
/// logging is enabled in `config.json`; otherwise the level is pinned to `info`.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
