pub mod config;
pub mod models;
pub mod nlp; // Rule-based segmenter/tagger + CoNLL-U dependency trees
pub mod pipeline;

use tracing_subscriber::EnvFilter;

/// Initialize tracing on stderr. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
