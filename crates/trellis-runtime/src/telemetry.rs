//! Tracing subscriber setup for applications embedding Trellis

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trellis_core::{Error, Result};

/// Install a global subscriber writing to stdout.
///
/// `RUST_LOG` takes precedence over `level`. `format` is `json` or `text`.
pub fn init(level: &str, format: &str) -> Result<()> {
    init_with_writer(level, format, std::io::stdout)
}

/// Install a global subscriber writing to `writer`
pub fn init_with_writer<W>(level: &str, format: &str, writer: W) -> Result<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| Error::Config(format!("Invalid log level '{level}': {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        "json" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_writer(writer),
            )
            .try_init(),
        "text" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(writer),
            )
            .try_init(),
        other => {
            return Err(Error::Config(format!("Unsupported log format: {other}")));
        }
    };

    installed.map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))
}
