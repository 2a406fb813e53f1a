//! Shared configuration for the texpng render service and its CLI client.
//!
//! Both binaries load [`Config`] through `ortho_config`, so the same layering
//! applies everywhere: built-in defaults, then a configuration file, then
//! `TEXPNG_*` environment variables, then command-line flags. The client
//! forwards its configuration flags to the service it spawns so the pair
//! agree on the listener address and the runtime directory.

mod args;
mod defaults;
mod logging;
mod runtime;

use std::path::{Path, PathBuf};

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use args::{CONFIG_CLI_FLAGS, ConfigArgumentSplit, split_config_arguments};
pub use defaults::{
    DEFAULT_FONT_FAMILY, DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_PORT, default_font_family,
    default_host, default_log_filter, default_log_filter_string, default_log_format, default_port,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use runtime::{
    LOCK_FILE_NAME, ProcessRecordError, RECORD_FILE_NAME, RuntimePaths, RuntimePathsError,
    read_process_record, remove_runtime_file,
};

/// Configuration shared by `texpngd` and `texpng`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TEXPNG")]
pub struct Config {
    /// Interface the render service binds and the client connects to.
    #[serde(default = "default_host")]
    #[ortho_config(default = default_host())]
    pub host: String,
    /// TCP port of the render service.
    #[serde(default = "default_port")]
    #[ortho_config(default = DEFAULT_PORT)]
    pub port: u16,
    /// Directory holding the process record and startup lock.
    ///
    /// Defaults to the directory containing the running executable.
    #[serde(default)]
    pub runtime_dir: Option<PathBuf>,
    /// Base directory for relative output paths in render requests.
    ///
    /// Defaults to the service's working directory at launch.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Font family the rasteriser falls back to for text nodes.
    #[serde(default = "default_font_family")]
    #[ortho_config(default = default_font_family())]
    pub font_family: String,
    /// Tracing filter expression, in `EnvFilter` syntax.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            runtime_dir: None,
            output_dir: None,
            font_family: default_font_family(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Host name or address of the render service.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port of the render service.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` label used in logs and error messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL of the render service's HTTP interface.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address())
    }

    /// Explicitly configured runtime directory, if any.
    pub fn runtime_dir(&self) -> Option<&Path> {
        self.runtime_dir.as_deref()
    }

    /// Explicitly configured output base directory, if any.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Fallback font family for the rasteriser.
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Returns the configured tracing filter.
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_local_service() {
        let config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:3000");
        assert_eq!(config.base_url(), "http://127.0.0.1:3000");
        assert_eq!(config.font_family(), DEFAULT_FONT_FAMILY);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert!(config.runtime_dir().is_none());
    }
}
