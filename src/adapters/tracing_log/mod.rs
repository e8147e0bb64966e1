// Tracing log adapter - Structured logging using tracing crate

use tracing_subscriber::EnvFilter;

use crate::domain::errors::CutError;

/// Level used when nothing else is configured
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Resolved logging options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// `EnvFilter` directive
    pub filter: String,
    pub json: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

/// Install the global subscriber writing to stderr.
///
/// Returns `Ok(false)` when a subscriber was already installed.
pub fn init_logging(options: &LogOptions) -> Result<bool, CutError> {
    let filter = EnvFilter::try_new(&options.filter)
        .map_err(|e| CutError::Config(format!("invalid log level '{}': {}", options.filter, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if options.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };
    Ok(installed)
}
