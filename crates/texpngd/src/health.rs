//! Structured health reporting for render service lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::http::RenderError;
use crate::typeset::TypesetError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before the typesetting engine is initialised.
    fn engine_starting(&self);

    /// Invoked once the engine has converted its warm-up fragment.
    fn engine_ready(&self);

    /// Invoked when the engine fails to initialise.
    fn engine_failed(&self, error: &TypesetError);

    /// Invoked after the HTTP listener binds.
    fn listener_bound(&self, address: SocketAddr);

    /// Invoked after a render request writes its output.
    fn render_completed(&self, file: &str);

    /// Invoked when a render request fails.
    fn render_failed(&self, error: &RenderError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn engine_starting(&self) {
        (**self).engine_starting();
    }

    fn engine_ready(&self) {
        (**self).engine_ready();
    }

    fn engine_failed(&self, error: &TypesetError) {
        (**self).engine_failed(error);
    }

    fn listener_bound(&self, address: SocketAddr) {
        (**self).listener_bound(address);
    }

    fn render_completed(&self, file: &str) {
        (**self).render_completed(file);
    }

    fn render_failed(&self, error: &RenderError) {
        (**self).render_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn engine_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "engine_starting",
            "initialising typesetting engine"
        );
    }

    fn engine_ready(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "engine_ready",
            "typesetting engine ready"
        );
    }

    fn engine_failed(&self, error: &TypesetError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "engine_failed",
            error = %error,
            "typesetting engine failed to start"
        );
    }

    fn listener_bound(&self, address: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_bound",
            %address,
            "render service listening"
        );
    }

    fn render_completed(&self, file: &str) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "render_completed",
            file,
            "render request completed"
        );
    }

    fn render_failed(&self, error: &RenderError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "render_failed",
            status = error.status().as_u16(),
            error = %error,
            "render request failed"
        );
    }
}
