//! HTTP interface of the render service.
//!
//! Two routes: `GET /status` answers liveness probes and `POST /render`
//! turns a TeX file into a PNG. Every failure is reported as a JSON
//! `{"error": …}` body; a bad request never takes the service down.

mod context;
mod errors;
mod handlers;

use axum::Router;
use axum::routing::{get, post};

use texpng_types::{RENDER_PATH, STATUS_PATH};

pub use context::{RenderContext, RenderJob};
pub use errors::RenderError;

pub(crate) const HTTP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::http");

/// Builds the service router around `context`.
pub fn router(context: RenderContext) -> Router {
    Router::new()
        .route(STATUS_PATH, get(handlers::status))
        .route(RENDER_PATH, post(handlers::render))
        .with_state(context)
}
