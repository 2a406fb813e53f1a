//! Seam between request handling and the TeX typesetting engine.
//!
//! The HTTP layer only sees [`Typesetter`], so tests can swap the MathJax
//! engine for a recording fake. [`EngineLauncher`] is the matching seam for
//! service startup.

mod mathjax;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::macros::MacroTable;

pub use mathjax::{MathJaxEngine, MathJaxLauncher};

/// Placeholder colour MathJax writes into its SVG output.
pub const CURRENT_COLOR: &str = "currentColor";

/// A single fragment to typeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypesetRequest {
    /// TeX source without delimiters.
    pub tex: String,
    /// Render as display math rather than inline math.
    pub display: bool,
    /// CSS colour substituted for `currentColor`.
    pub color: String,
}

/// Errors raised by the typesetting engine.
#[derive(Debug, Error)]
pub enum TypesetError {
    /// The engine rejected the source or failed while converting it.
    #[error("typesetting engine failed: {message}")]
    Engine {
        /// Engine diagnostic.
        message: String,
    },
    /// The engine worker is gone and cannot accept work.
    #[error("typesetting engine is not running")]
    Stopped,
    /// The engine worker thread could not be spawned.
    #[error("failed to spawn typesetting worker: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Converts TeX fragments to SVG markup.
#[async_trait]
pub trait Typesetter: Send + Sync {
    /// Typesets `request` and returns SVG markup with the colour applied.
    async fn typeset(&self, request: TypesetRequest) -> Result<String, TypesetError>;
}

/// Starts a typesetting engine primed with the service's macros.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    /// Initialises the engine; called once per service start.
    async fn launch(&self, macros: MacroTable) -> Result<Arc<dyn Typesetter>, TypesetError>;
}

/// Builds the engine source for a fragment by prepending the macro prelude.
///
/// The fragment stays at the top level so display-only constructs such as
/// `\tag` keep working; the math mode is chosen by the engine call instead.
pub fn compose_source(prelude: &str, tex: &str) -> String {
    format!("{prelude}{tex}")
}

/// Replaces MathJax's `currentColor` placeholder with `color`.
pub fn apply_color(svg: &str, color: &str) -> String {
    svg.replace(CURRENT_COLOR, color)
}
