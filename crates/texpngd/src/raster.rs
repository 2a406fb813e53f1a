//! SVG to PNG rasterisation via `resvg`.
//!
//! System fonts are never loaded: MathJax emits glyphs as paths, so the
//! font database stays empty and the configured family only names the
//! fallback for stray text nodes.

use std::sync::Arc;

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use thiserror::Error;

/// Extra pixels added to the base font size for display math.
pub const DISPLAY_FONT_SIZE_BONUS: f32 = 5.0;

/// Per-render options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Root font size in pixels; `ex`-based SVG dimensions scale with it.
    pub font_size: f32,
}

impl RasterOptions {
    /// Options for a fragment rendered at `font_size`, enlarged in display
    /// mode.
    pub fn for_content(font_size: f32, display: bool) -> Self {
        let font_size = if display {
            font_size + DISPLAY_FONT_SIZE_BONUS
        } else {
            font_size
        };
        Self { font_size }
    }
}

/// Errors raised while rasterising SVG markup.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The markup was not valid SVG.
    #[error("failed to parse SVG: {source}")]
    Parse {
        /// Underlying parser error.
        #[source]
        source: resvg::usvg::Error,
    },
    /// The SVG resolved to an image with no pixels.
    #[error("SVG has an empty canvas ({width}x{height})")]
    EmptyCanvas {
        /// Canvas width in pixels.
        width: u32,
        /// Canvas height in pixels.
        height: u32,
    },
    /// PNG encoding failed.
    #[error("failed to encode PNG: {message}")]
    Encode {
        /// Encoder diagnostic.
        message: String,
    },
}

/// Renders SVG markup to PNG bytes.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    font_family: Arc<str>,
}

impl Rasterizer {
    /// Builds a rasteriser falling back to `font_family` for text.
    pub fn new(font_family: impl Into<Arc<str>>) -> Self {
        Self {
            font_family: font_family.into(),
        }
    }

    /// Fallback font family.
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Rasterises `svg` at its intrinsic size and encodes it as PNG.
    ///
    /// # Errors
    ///
    /// Fails when the markup does not parse, resolves to an empty canvas, or
    /// cannot be encoded.
    pub fn render_png(&self, svg: &str, options: RasterOptions) -> Result<Vec<u8>, RasterError> {
        let mut usvg_options = Options::default();
        usvg_options.font_family = self.font_family.to_string();
        usvg_options.font_size = options.font_size;

        let tree =
            Tree::from_str(svg, &usvg_options).map_err(|source| RasterError::Parse { source })?;
        let size = tree.size().to_int_size();
        let (width, height) = (size.width(), size.height());
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RasterError::EmptyCanvas { width, height })?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
        pixmap.encode_png().map_err(|error| RasterError::Encode {
            message: error.to_string(),
        })
    }
}
