//! Test doubles for the CLI runner.

use std::ffi::OsString;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::oneshot;

use texpng_config::Config;
use texpng_types::{ErrorBody, RENDER_PATH, RenderRequest, RenderSuccess, STATUS_PATH, StatusBody};

use crate::{AppError, ConfigLoader};

/// Loader returning a prepared configuration.
pub(super) struct FixedConfigLoader(pub(super) Config);

impl ConfigLoader for FixedConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.0.clone())
    }
}

/// Port with no listener behind it.
pub(super) fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let port = listener.local_addr().expect("free port address").port();
    drop(listener);
    port
}

type Requests = Arc<Mutex<Vec<RenderRequest>>>;

#[derive(Clone)]
struct StubState {
    requests: Requests,
    failure: Option<String>,
}

/// Minimal render service answering on a background thread.
pub(super) struct StubService {
    address: SocketAddr,
    requests: Requests,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl StubService {
    pub(super) fn succeeding() -> Self {
        Self::start(None)
    }

    pub(super) fn failing(message: &str) -> Self {
        Self::start(Some(message.to_owned()))
    }

    fn start(failure: Option<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub service");
        listener.set_nonblocking(true).expect("non-blocking listener");
        let address = listener.local_addr().expect("stub address");
        let requests = Requests::default();
        let state = StubState {
            requests: Arc::clone(&requests),
            failure,
        };
        let router = Router::new()
            .route(STATUS_PATH, get(|| async { Json(StatusBody::ok()) }))
            .route(RENDER_PATH, post(render))
            .with_state(state);
        let (shutdown, stop) = oneshot::channel::<()>();
        let thread = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("stub runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        drop(stop.await);
                    })
                    .await
                    .expect("stub service");
            });
        });
        Self {
            address,
            requests,
            shutdown: Some(shutdown),
            thread: Some(thread),
        }
    }

    pub(super) const fn port(&self) -> u16 {
        self.address.port()
    }

    pub(super) fn requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }
}

impl Drop for StubService {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            drop(shutdown.send(()));
        }
        if let Some(thread) = self.thread.take() {
            drop(thread.join());
        }
    }
}

async fn render(
    State(state): State<StubState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderSuccess>, (StatusCode, Json<ErrorBody>)> {
    let file = request.out_file_or_default().to_owned();
    state
        .requests
        .lock()
        .expect("requests mutex poisoned")
        .push(request);
    match state.failure {
        Some(error) => Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error }))),
        None => Ok(Json(RenderSuccess::new(file))),
    }
}
