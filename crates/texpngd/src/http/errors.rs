use std::io;
use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use texpng_types::ErrorBody;

use crate::raster::RasterError;
use crate::typeset::TypesetError;

/// Failures of a single render request.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The body was not a JSON render request.
    #[error("Invalid request body: {message}")]
    MalformedBody {
        /// Rejection detail from the JSON extractor.
        message: String,
    },
    /// A required field was absent or empty.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Wire name of the field.
        field: &'static str,
    },
    /// The colour cannot be embedded in an SVG attribute.
    #[error("Invalid color '{color}': expected a CSS colour")]
    InvalidColor {
        /// Colour as supplied.
        color: String,
    },
    /// The font size was not a positive finite number.
    #[error("Invalid fontSize {size}: expected a positive number")]
    InvalidFontSize {
        /// Size as supplied.
        size: f32,
    },
    /// The input file could not be read.
    #[error("Failed to read input file: {source}")]
    ReadInput {
        /// Resolved input path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The typesetting engine failed.
    #[error("Typesetting failed: {source}")]
    Typeset {
        /// Underlying engine error.
        #[from]
        source: TypesetError,
    },
    /// The rasteriser failed.
    #[error("Rasterisation failed: {source}")]
    Raster {
        /// Underlying rasteriser error.
        #[from]
        source: RasterError,
    },
    /// The PNG could not be written.
    #[error("Failed to write output file '{path}': {source}")]
    WriteOutput {
        /// Resolved output path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The blocking rasterisation task panicked or was cancelled.
    #[error("Render worker failed: {message}")]
    Worker {
        /// Join failure description.
        message: String,
    },
}

impl RenderError {
    /// HTTP status reported for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedBody { .. }
            | Self::MissingField { .. }
            | Self::InvalidColor { .. }
            | Self::InvalidFontSize { .. }
            | Self::ReadInput { .. } => StatusCode::BAD_REQUEST,
            Self::Typeset { .. }
            | Self::Raster { .. }
            | Self::WriteOutput { .. }
            | Self::Worker { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
