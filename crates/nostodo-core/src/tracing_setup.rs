use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Env var naming an optional log file that receives debug-level output
pub const LOG_FILE_ENV: &str = "NOSTODO_LOG_FILE";

pub fn init_tracing() {
    // RUST_LOG wins; otherwise info for our crates and warn for the relay pool
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nostr_relay_pool=warn"));

    let registry = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter),
    );

    let file = std::env::var(LOG_FILE_ENV)
        .ok()
        .and_then(|path| match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some((path, file)),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path, e);
                None
            }
        });

    if let Some((path, file)) = file {
        let file_layer = fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);

        registry.with(file_layer).init();
        eprintln!("File logging enabled: {}", path);
    } else {
        registry.init();
    }
}
