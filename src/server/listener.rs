//! Listener pool manager.
//!
//! The bound socket is shared by a pool of accept tasks held at a
//! high-water target; every completed accept spawns the connection's
//! handler task and loops straight back into accepting, so the supply of
//! pending accepts stays elastic under load. A fatal accept error tears
//! the socket down and rebuilds it (re-bind, re-listen, refill the pool)
//! after a short backoff; transient accept errors are logged and the pool
//! self-corrects on the next cycle.

use crate::http::connection::Connection;
use crate::server::ServerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

/// High-water target of concurrently outstanding accepts.
const ACCEPT_POOL: usize = 1500;

/// Backoff before rebuilding a dead listener.
const REBIND_DELAY: Duration = Duration::from_millis(500);

/// Rebind attempts before declaring the instance down.
const REBIND_ATTEMPTS: u32 = 3;

/// Supervises the listener across rebuilds until shutdown.
pub(crate) async fn run(
    listener: TcpListener,
    state: Arc<ServerState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut listener = Some(listener);
    loop {
        let listener_arc = match listener.take() {
            Some(l) => Arc::new(l),
            None => match rebind(&state, &mut shutdown).await {
                Some(l) => Arc::new(l),
                None => return,
            },
        };

        // One generation of the accept pool; the reset channel tears the
        // whole generation down so the socket's last Arc drops before
        // rebinding.
        let (reset_tx, reset_rx) = watch::channel(false);
        let (fail_tx, mut fail_rx) = mpsc::channel::<std::io::Error>(1);
        for _ in 0..ACCEPT_POOL {
            tokio::spawn(accept_loop(
                listener_arc.clone(),
                state.clone(),
                shutdown.clone(),
                reset_rx.clone(),
                fail_tx.clone(),
            ));
        }
        drop(fail_tx);
        drop(reset_rx);
        drop(listener_arc);

        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("listener pool shutting down");
                let _ = reset_tx.send(true);
                return;
            }
            failure = fail_rx.recv() => {
                if let Some(e) = failure {
                    tracing::warn!(error = %e, "listening socket lost, rebuilding");
                }
                let _ = reset_tx.send(true);
                tokio::time::sleep(REBIND_DELAY).await;
            }
        }
    }
}

async fn rebind(state: &ServerState, shutdown: &mut watch::Receiver<bool>) -> Option<TcpListener> {
    for attempt in 1..=REBIND_ATTEMPTS {
        if *shutdown.borrow() {
            return None;
        }
        match TcpListener::bind(&state.config.listen_addr).await {
            Ok(l) => {
                tracing::info!(addr = %state.config.listen_addr, "listener rebuilt");
                return Some(l);
            }
            Err(e) => {
                tracing::error!(error = %e, attempt, "rebind failed");
                tokio::select! {
                    _ = shutdown.changed() => return None,
                    _ = tokio::time::sleep(REBIND_DELAY) => {}
                }
            }
        }
    }
    tracing::error!("listener could not be rebuilt, server down");
    None
}

/// One member of the accept pool: accepts, hands the connection to its own
/// task, and immediately accepts again.
async fn accept_loop(
    listener: Arc<TcpListener>,
    state: Arc<ServerState>,
    mut shutdown: watch::Receiver<bool>,
    mut reset: watch::Receiver<bool>,
    fail: mpsc::Sender<std::io::Error>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => return,
            _ = reset.changed() => return,
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    let _ = socket.set_nodelay(true);
                    let state = state.clone();
                    tokio::spawn(async move {
                        let _ = Connection::new(socket, peer, state).run().await;
                    });
                }
                Err(e) if is_transient(&e) => {
                    tracing::warn!(error = %e, "accept failed, retrying");
                }
                Err(e) => {
                    // Socket-level failure; report once, the supervisor
                    // rebuilds the listener.
                    let _ = fail.try_send(e);
                    return;
                }
            }
        }
    }
}

/// Per-connection accept errors that do not indicate a dead socket.
fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
    )
}
