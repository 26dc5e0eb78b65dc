//! Terminal front end for the product search dashboard.

pub mod commands;
pub mod render;

use tracing_subscriber::EnvFilter;

/// JSON logs on stderr so they never interleave with rendered output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .init();
}
