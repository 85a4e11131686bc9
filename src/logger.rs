use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber. Logs go to stderr so `--json-only`
/// output on stdout stays machine-readable.
///
/// `level` accepts a bare level (`debug`) or a full filter directive
/// (`nondet_eval=trace,warn`). Unknown input falls back to `info`.
pub fn init(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
