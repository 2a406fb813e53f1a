//! Built-in defaults shared by the render service and its client.

use crate::logging::LogFormat;

/// Interface the render service binds when no host is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port the render service listens on when no port is configured.
pub const DEFAULT_PORT: u16 = 3000;

/// Fallback font family handed to the rasteriser for text nodes.
pub const DEFAULT_FONT_FAMILY: &str = "Latin Modern Math";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned host value used where allocation is required (e.g. serde).
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default listener port.
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Owned font family value used where allocation is required.
pub fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_owned()
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
