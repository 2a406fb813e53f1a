//! MathJax-backed typesetting engine.
//!
//! The converter runs on a dedicated worker thread so its start-up cost is
//! paid once and the async runtime never blocks on it. Requests travel over
//! a channel and the worker answers each one on a oneshot.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::macros::MacroTable;

use super::{EngineLauncher, TypesetError, TypesetRequest, Typesetter, apply_color, compose_source};

const TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::typeset");
const WORKER_NAME: &str = "texpngd-mathjax";
const WARM_UP_SOURCE: &str = "x";

struct Job {
    source: String,
    display: bool,
    reply: oneshot::Sender<Result<String, TypesetError>>,
}

/// Handle to the MathJax worker thread.
///
/// Dropping the last handle closes the channel and ends the worker.
#[derive(Debug)]
pub struct MathJaxEngine {
    prelude: String,
    jobs: mpsc::Sender<Job>,
}

impl MathJaxEngine {
    /// Spawns the worker, converts a warm-up fragment, and returns once the
    /// engine is ready.
    ///
    /// # Errors
    ///
    /// Fails when the worker cannot be spawned or the warm-up conversion
    /// fails.
    pub async fn start(macros: &MacroTable) -> Result<Self, TypesetError> {
        let (jobs, queue) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = oneshot::channel();
        thread::Builder::new()
            .name(WORKER_NAME.to_owned())
            .spawn(move || run_worker(&queue, ready_tx))
            .map_err(|source| TypesetError::Spawn { source })?;

        ready_rx.await.map_err(|_| TypesetError::Stopped)??;
        info!(
            target: TARGET,
            macros = macros.len(),
            "typesetting engine initialised"
        );
        Ok(Self {
            prelude: macros.prelude(),
            jobs,
        })
    }
}

#[async_trait]
impl Typesetter for MathJaxEngine {
    async fn typeset(&self, request: TypesetRequest) -> Result<String, TypesetError> {
        let source = compose_source(&self.prelude, &request.tex);
        let (reply, response) = oneshot::channel();
        self.jobs
            .send(Job {
                source,
                display: request.display,
                reply,
            })
            .map_err(|_| TypesetError::Stopped)?;
        let svg = response.await.map_err(|_| TypesetError::Stopped)??;
        Ok(apply_color(&svg, &request.color))
    }
}

fn run_worker(
    queue: &mpsc::Receiver<Job>,
    ready: oneshot::Sender<Result<(), TypesetError>>,
) {
    if let Err(error) = convert(WARM_UP_SOURCE, true) {
        drop(ready.send(Err(error)));
        return;
    }
    if ready.send(Ok(())).is_err() {
        return;
    }

    while let Ok(job) = queue.recv() {
        debug!(
            target: TARGET,
            bytes = job.source.len(),
            display = job.display,
            "typesetting fragment"
        );
        // The requester may have gone away; its result is simply discarded.
        drop(job.reply.send(convert(&job.source, job.display)));
    }
    debug!(target: TARGET, "typesetting worker exiting");
}

fn convert(source: &str, display: bool) -> Result<String, TypesetError> {
    let converted = if display {
        mathjax_svg::convert_to_svg(source)
    } else {
        mathjax_svg::convert_to_svg_inline(source)
    };
    converted.map_err(|error| TypesetError::Engine {
        message: format!("{error:?}"),
    })
}

/// Launcher that starts a [`MathJaxEngine`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MathJaxLauncher;

#[async_trait]
impl EngineLauncher for MathJaxLauncher {
    async fn launch(&self, macros: MacroTable) -> Result<Arc<dyn Typesetter>, TypesetError> {
        let engine = MathJaxEngine::start(&macros).await?;
        Ok(Arc::new(engine))
    }
}
