//! Helpers behind the `multivec` binary: dataset loading, the demo encoder,
//! retrieval metrics, and logging bootstrap.

pub mod dataset;
pub mod encoder;
pub mod eval;
mod logging;

pub use logging::init_tracing_with_config;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
