use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use texpng_types::{DEFAULT_OUT_FILE, RenderRequest};

use crate::health::HealthReporter;
use crate::normalize::normalize;
use crate::raster::{RasterOptions, Rasterizer};
use crate::typeset::{TypesetRequest, Typesetter};

use super::HTTP_TARGET;
use super::errors::RenderError;

/// Characters that would break out of an SVG attribute value.
const FORBIDDEN_COLOR_CHARS: &[char] = &['"', '\'', '<', '>', '&'];

/// A validated render request with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    /// Input path as supplied.
    pub input_file: String,
    /// Output path as supplied, or the default.
    pub out_file: String,
    /// Fill colour.
    pub color: String,
    /// Base font size in pixels.
    pub font_size: f32,
}

impl TryFrom<RenderRequest> for RenderJob {
    type Error = RenderError;

    fn try_from(request: RenderRequest) -> Result<Self, Self::Error> {
        let input_file = request
            .input_file
            .as_deref()
            .filter(|input| !input.is_empty())
            .ok_or(RenderError::MissingField { field: "inputFile" })?
            .to_owned();

        let color = request.color_or_default();
        if color.is_empty() || color.contains(FORBIDDEN_COLOR_CHARS) {
            return Err(RenderError::InvalidColor {
                color: color.to_owned(),
            });
        }

        let font_size = request.font_size_or_default();
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(RenderError::InvalidFontSize { size: font_size });
        }

        let out_file = request
            .out_file
            .as_deref()
            .filter(|out| !out.is_empty())
            .unwrap_or(DEFAULT_OUT_FILE)
            .to_owned();

        Ok(Self {
            input_file,
            out_file,
            color: color.to_owned(),
            font_size,
        })
    }
}

/// Shared state handed to every request.
#[derive(Clone)]
pub struct RenderContext {
    engine: Arc<dyn Typesetter>,
    rasterizer: Rasterizer,
    base_dir: Arc<PathBuf>,
    reporter: Arc<dyn HealthReporter>,
}

impl RenderContext {
    /// Builds the context. Relative request paths resolve against
    /// `base_dir`.
    pub fn new(
        engine: Arc<dyn Typesetter>,
        rasterizer: Rasterizer,
        base_dir: PathBuf,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            engine,
            rasterizer,
            base_dir: Arc::new(base_dir),
            reporter,
        }
    }

    /// Base directory for relative request paths.
    pub fn base_dir(&self) -> &Path {
        self.base_dir.as_path()
    }

    pub(crate) fn reporter(&self) -> &dyn HealthReporter {
        self.reporter.as_ref()
    }

    /// Runs the full pipeline for `request` and returns the output path as
    /// the request named it.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] describing the first failing stage.
    pub async fn render(&self, request: RenderRequest) -> Result<String, RenderError> {
        let job = RenderJob::try_from(request)?;

        let input_path = self.base_dir.join(&job.input_file);
        let source = tokio::fs::read_to_string(&input_path)
            .await
            .map_err(|source| RenderError::ReadInput {
                path: input_path.clone(),
                source,
            })?;

        let content = normalize(&source);
        debug!(
            target: HTTP_TARGET,
            input = %input_path.display(),
            display = content.display_mode,
            "normalised input"
        );
        let display = content.display_mode;
        let svg = self
            .engine
            .typeset(TypesetRequest {
                tex: content.text,
                display,
                color: job.color.clone(),
            })
            .await?;

        let options = RasterOptions::for_content(job.font_size, display);
        let rasterizer = self.rasterizer.clone();
        let png = tokio::task::spawn_blocking(move || rasterizer.render_png(&svg, options))
            .await
            .map_err(|error| RenderError::Worker {
                message: error.to_string(),
            })??;

        let output_path = self.base_dir.join(&job.out_file);
        tokio::fs::write(&output_path, png)
            .await
            .map_err(|source| RenderError::WriteOutput {
                path: output_path.clone(),
                source,
            })?;
        debug!(
            target: HTTP_TARGET,
            output = %output_path.display(),
            "wrote rendered image"
        );
        Ok(job.out_file)
    }
}
