//! stagehand CLI entry point

fn main() {
    // Structured logging to stderr, quiet by default so it never interleaves
    // with status lines. `RUST_LOG=stagehand=debug` shows every subprocess.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    stagehand::cli::run();
}
