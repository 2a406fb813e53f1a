//! Wire types exchanged between the texpng CLI and the render service.
//!
//! Bodies are JSON with camelCase field names. The canonical render defaults
//! live here so the client and the service fill omitted fields identically.

use serde::{Deserialize, Serialize};

/// Route answering liveness probes.
pub const STATUS_PATH: &str = "/status";

/// Route accepting render requests.
pub const RENDER_PATH: &str = "/render";

/// Output file used when a request omits `outFile`.
pub const DEFAULT_OUT_FILE: &str = "output.png";

/// Fill colour used when a request omits `color`.
pub const DEFAULT_COLOR: &str = "#008000";

/// Base font size, in pixels, used when a request omits `fontSize`.
pub const DEFAULT_FONT_SIZE: f32 = 25.0;

/// Body of a `POST /render` request.
///
/// Every field is optional on the wire so the service can report a missing
/// `inputFile` itself rather than failing body deserialisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Path of the file holding the TeX source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    /// Destination of the PNG image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_file: Option<String>,
    /// CSS colour substituted for `currentColor` in the rendered SVG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Base font size in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

impl RenderRequest {
    /// Creates a request for `input_file` with every other field defaulted.
    #[must_use]
    pub fn new(input_file: impl Into<String>) -> Self {
        Self {
            input_file: Some(input_file.into()),
            ..Self::default()
        }
    }

    /// Sets the destination path.
    #[must_use]
    pub fn with_out_file(mut self, out_file: impl Into<String>) -> Self {
        self.out_file = Some(out_file.into());
        self
    }

    /// Sets the fill colour.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the base font size.
    #[must_use]
    pub const fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Destination path, falling back to [`DEFAULT_OUT_FILE`].
    #[must_use]
    pub fn out_file_or_default(&self) -> &str {
        self.out_file.as_deref().unwrap_or(DEFAULT_OUT_FILE)
    }

    /// Fill colour, falling back to [`DEFAULT_COLOR`].
    #[must_use]
    pub fn color_or_default(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    /// Font size, falling back to [`DEFAULT_FONT_SIZE`].
    #[must_use]
    pub fn font_size_or_default(&self) -> f32 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }
}

/// Body of a successful render response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSuccess {
    /// Always `true`.
    pub success: bool,
    /// The output path exactly as the request named it.
    pub file: String,
}

impl RenderSuccess {
    /// Builds a success body for `file`.
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            success: true,
            file: file.into(),
        }
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    pub error: String,
}

/// Body of the `GET /status` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    /// Always `"ok"` while the service is serving.
    pub status: String,
}

impl StatusBody {
    /// The body reported by a healthy service.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_and_omits_unset_fields() {
        let request = RenderRequest::new("/tmp/in.tex").with_font_size(30.0);
        let json = serde_json::to_value(&request).expect("serialise request");
        assert_eq!(
            json,
            serde_json::json!({ "inputFile": "/tmp/in.tex", "fontSize": 30.0 })
        );
    }

    #[test]
    fn request_defaults_fill_missing_fields() {
        let request: RenderRequest =
            serde_json::from_str(r#"{"inputFile":"a.tex","fontSize":12}"#).expect("parse");
        assert_eq!(request.input_file.as_deref(), Some("a.tex"));
        assert_eq!(request.out_file_or_default(), DEFAULT_OUT_FILE);
        assert_eq!(request.color_or_default(), DEFAULT_COLOR);
        assert!((request.font_size_or_default() - 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_body_deserialises_without_input() {
        let request: RenderRequest = serde_json::from_str("{}").expect("parse");
        assert!(request.input_file.is_none());
    }
}
