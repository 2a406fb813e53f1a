//! Readiness polling for a freshly spawned service.

use std::process::Child;
use std::time::{Duration, Instant};

use crate::transport::RenderClient;

use super::error::LifecycleError;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Polls `/status` until the service answers.
///
/// A clean exit of `child` means the service detached into the background
/// (or found a running instance), so polling continues; a failing exit
/// aborts immediately.
pub(super) async fn wait_for_ready(
    client: &RenderClient,
    child: &mut Child,
    address: &str,
) -> Result<(), LifecycleError> {
    wait_for_ready_within(client, child, address, STARTUP_TIMEOUT).await
}

async fn wait_for_ready_within(
    client: &RenderClient,
    child: &mut Child,
    address: &str,
    timeout: Duration,
) -> Result<(), LifecycleError> {
    let deadline = Instant::now() + timeout;
    let mut detached = false;
    while Instant::now() < deadline {
        if client.is_healthy().await {
            return Ok(());
        }
        if !detached {
            if let Some(status) = child
                .try_wait()
                .map_err(|source| LifecycleError::MonitorChild { source })?
            {
                if !status.success() {
                    return Err(LifecycleError::StartupFailed {
                        exit_status: status.code(),
                    });
                }
                detached = true;
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    Err(LifecycleError::StartupTimeout {
        address: address.to_owned(),
        timeout_ms: timeout.as_millis(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::process::Command;

    fn closed_address() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind free port");
        let address = listener.local_addr().expect("free port address");
        drop(listener);
        address.to_string()
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime")
    }

    #[test]
    fn failing_child_aborts_the_wait() {
        let address = closed_address();
        let client = RenderClient::new(format!("http://{address}")).expect("client");
        let mut child = Command::new("false").spawn().expect("spawn false");
        let result = runtime().block_on(wait_for_ready_within(
            &client,
            &mut child,
            &address,
            Duration::from_secs(5),
        ));
        assert!(matches!(
            result,
            Err(LifecycleError::StartupFailed {
                exit_status: Some(1)
            })
        ));
    }

    #[test]
    fn detached_child_without_a_listener_times_out() {
        let address = closed_address();
        let client = RenderClient::new(format!("http://{address}")).expect("client");
        let mut child = Command::new("true").spawn().expect("spawn true");
        let result = runtime().block_on(wait_for_ready_within(
            &client,
            &mut child,
            &address,
            Duration::from_millis(600),
        ));
        match result {
            Err(LifecycleError::StartupTimeout {
                address: reported, ..
            }) => assert_eq!(reported, address),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
