//! Log output for the render service.
//!
//! Events go to stderr so `texpngd stop` and the informational start
//! messages keep stdout to themselves. Detached services inherit a null
//! stderr, so JSON is the default for log shippers and `compact` is there for
//! foreground debugging.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use texpng_config::{Config, LogFormat};

static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Proof that logging is configured, carrying the format in effect.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by the first successful [`initialise`] call.
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Reasons logging could not be configured.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid `tracing` directive list.
    #[error("log filter `{filter}` is invalid: {message}")]
    Filter {
        /// Directive text from configuration.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Some other code already installed a global subscriber.
    #[error("a global log subscriber is already installed: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Routes `tracing` events to stderr using the configured filter and format.
///
/// Only the first call installs anything; later calls report the format
/// already in effect, even if `config` asks for another one.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] when a foreign subscriber got there first.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let format = INSTALLED_FORMAT.get_or_try_init(|| {
        let filter = service_filter(config.log_filter())?;
        tracing::subscriber::set_global_default(stderr_subscriber(filter, config.log_format()))
            .map_err(TelemetryError::Subscriber)?;
        Ok::<_, TelemetryError>(config.log_format())
    })?;
    Ok(TelemetryHandle { format: *format })
}

fn service_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|error| TelemetryError::Filter {
        filter: directives.to_owned(),
        message: error.to_string(),
    })
}

fn stderr_subscriber(filter: EnvFilter, format: LogFormat) -> Box<dyn Subscriber + Send + Sync> {
    let base = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339())
        .with_thread_names(true);
    match format {
        LogFormat::Json => Box::new(base.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(base.compact().finish()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn malformed_filter_names_the_directive() {
        let error = service_filter("texpngd=bogus").expect_err("filter should be rejected");
        assert!(matches!(&error, TelemetryError::Filter { filter, .. } if filter == "texpngd=bogus"));
        assert!(error.to_string().contains("texpngd=bogus"));
    }

    #[rstest]
    #[case("info")]
    #[case("texpngd=debug,tower_http=warn")]
    fn accepts_service_filters(#[case] directives: &str) {
        service_filter(directives).expect("filter should parse");
    }
}
