//! Supervises render service launch sequencing and runtime orchestration.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use texpng_config::{Config, RuntimePaths};

use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::http::{self, RenderContext};
use crate::macros::MacroTable;
use crate::raster::Rasterizer;
use crate::typeset::{EngineLauncher, MathJaxLauncher};

use super::daemonizer::{Daemonizer, SystemDaemonizer};
use super::errors::LaunchError;
use super::guard::ProcessGuard;
use super::probe::{ProcessProbe, SystemProcessProbe};
use super::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
use super::{DRAIN_TIMEOUT, FOREGROUND_ENV_VAR, PROCESS_TARGET};

/// Launch mode for the render service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Fork into the background and detach from the controlling terminal.
    Background,
    /// Remain attached to the terminal; used for debugging and tests.
    Foreground,
}

impl LaunchMode {
    /// Foreground when `TEXPNG_FOREGROUND` is set, background otherwise.
    pub fn detect() -> Self {
        if env::var_os(FOREGROUND_ENV_VAR).is_some() {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}

/// Process-level collaborators needed to control the service lifecycle.
pub struct ProcessControl<D, S> {
    /// Whether to detach before serving.
    pub mode: LaunchMode,
    /// Detaches the process in background mode.
    pub daemonizer: D,
    /// Resolves when the service should stop.
    pub shutdown: S,
}

/// Service dependencies required to construct the render runtime.
pub struct ServiceDeps<E, P> {
    /// Starts the typesetting engine.
    pub launcher: E,
    /// Checks PIDs found in stale runtime artefacts.
    pub probe: P,
    /// Receives lifecycle events.
    pub reporter: Arc<dyn HealthReporter>,
}

/// Everything required to launch the render service.
pub struct LaunchPlan<E, P, D, S> {
    /// Loaded configuration.
    pub config: Config,
    /// Optional user macro file.
    pub macros: Option<PathBuf>,
    /// Process-level collaborators.
    pub process: ProcessControl<D, S>,
    /// Service-level collaborators.
    pub services: ServiceDeps<E, P>,
}

/// Runs the render service using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError::AlreadyRunning`] or
/// [`LaunchError::StartupInProgress`] when another instance owns the runtime
/// directory, and any other variant when startup or serving fails.
pub fn run_daemon(config: Config, macros: Option<PathBuf>) -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        config,
        macros,
        process: ProcessControl {
            mode: LaunchMode::detect(),
            daemonizer: SystemDaemonizer,
            shutdown: SystemShutdownSignal,
        },
        services: ServiceDeps {
            launcher: MathJaxLauncher,
            probe: SystemProcessProbe,
            reporter: Arc::new(StructuredHealthReporter::new()),
        },
    };
    run_daemon_with(plan)
}

/// Runs the render service with injected collaborators.
///
/// # Errors
///
/// See [`run_daemon`].
pub fn run_daemon_with<E, P, D, S>(plan: LaunchPlan<E, P, D, S>) -> Result<(), LaunchError>
where
    E: EngineLauncher,
    P: ProcessProbe,
    D: Daemonizer,
    S: ShutdownSignal + 'static,
{
    let LaunchPlan {
        config,
        macros,
        process,
        services,
    } = plan;
    let ProcessControl {
        mode,
        daemonizer,
        shutdown,
    } = process;
    let ServiceDeps {
        launcher,
        probe,
        reporter,
    } = services;

    info!(
        target: PROCESS_TARGET,
        ?mode,
        address = %config.address(),
        "starting render service"
    );
    let runtime_paths = RuntimePaths::from_config(&config)?;
    let guard = ProcessGuard::acquire(runtime_paths, &probe)?;
    // Resolved before daemonising, which moves the working directory.
    let output_dir = match config.output_dir() {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().map_err(|source| LaunchError::OutputDir { source })?,
    };
    let macros = MacroTable::load(macros.as_deref())?;
    if matches!(mode, LaunchMode::Background) {
        daemonizer.daemonize(guard.paths())?;
        guard.claim(std::process::id())?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("texpngd-worker")
        .build()
        .map_err(|source| LaunchError::Runtime { source })?;
    let session = ServeSession {
        config: &config,
        guard: &guard,
        output_dir,
        reporter,
    };
    runtime.block_on(session.serve(&launcher, macros, shutdown))?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}

struct ServeSession<'a> {
    config: &'a Config,
    guard: &'a ProcessGuard,
    output_dir: PathBuf,
    reporter: Arc<dyn HealthReporter>,
}

impl ServeSession<'_> {
    async fn serve<E, S>(
        self,
        launcher: &E,
        macros: MacroTable,
        shutdown: S,
    ) -> Result<(), LaunchError>
    where
        E: EngineLauncher,
        S: ShutdownSignal + 'static,
    {
        let stop_requested = spawn_shutdown_listener(shutdown)?;

        self.reporter.engine_starting();
        let engine = match launcher.launch(macros).await {
            Ok(engine) => {
                self.reporter.engine_ready();
                engine
            }
            Err(source) => {
                self.reporter.engine_failed(&source);
                return Err(LaunchError::Engine { source });
            }
        };

        let listener = TcpListener::bind((self.config.host(), self.config.port()))
            .await
            .map_err(|source| LaunchError::Bind {
                address: self.config.address(),
                source,
            })?;
        let address = listener.local_addr().map_err(|source| LaunchError::Bind {
            address: self.config.address(),
            source,
        })?;
        self.reporter.listener_bound(address);
        self.guard.write_record(std::process::id())?;

        let context = RenderContext::new(
            engine,
            Rasterizer::new(self.config.font_family()),
            self.output_dir,
            self.reporter,
        );
        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, http::router(context))
                .with_graceful_shutdown(async move {
                    // A dropped sender also starts the drain.
                    drop(drain_rx.await);
                })
                .await
        });

        tokio::select! {
            signal = stop_requested => {
                info!(target: PROCESS_TARGET, "draining in-flight requests");
                drop(drain_tx.send(()));
                drain(server).await?;
                match signal {
                    Ok(outcome) => outcome.map_err(LaunchError::from),
                    Err(_) => Err(LaunchError::ShutdownListenerLost),
                }
            }
            finished = &mut server => {
                warn!(target: PROCESS_TARGET, "render server stopped before shutdown was requested");
                flatten(finished)
            }
        }
    }
}

fn spawn_shutdown_listener<S>(
    shutdown: S,
) -> Result<oneshot::Receiver<Result<(), ShutdownError>>, LaunchError>
where
    S: ShutdownSignal + 'static,
{
    let (tx, rx) = oneshot::channel();
    thread::Builder::new()
        .name("texpngd-signals".to_owned())
        .spawn(move || {
            drop(tx.send(shutdown.wait()));
        })
        .map_err(|source| LaunchError::ShutdownThread { source })?;
    Ok(rx)
}

async fn drain(server: JoinHandle<std::io::Result<()>>) -> Result<(), LaunchError> {
    match tokio::time::timeout(DRAIN_TIMEOUT, server).await {
        Ok(finished) => flatten(finished),
        Err(_) => {
            warn!(
                target: PROCESS_TARGET,
                timeout_ms = DRAIN_TIMEOUT.as_millis(),
                "in-flight requests did not drain in time; abandoning them"
            );
            Ok(())
        }
    }
}

fn flatten(
    finished: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), LaunchError> {
    match finished {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(LaunchError::Serve { source }),
        Err(error) => Err(LaunchError::ServerTask {
            message: error.to_string(),
        }),
    }
}
