use std::future::Future;

use anyhow::Context;
use tokio::{net::TcpListener, sync::broadcast, task::JoinSet};

use crate::coordinator::Coordinator;

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod session;
pub mod validator;

/// Accept peers on `listener` until `shutdown` resolves, then wait for every session to close
///
/// Command lines longer than `max_line_length` bytes are dropped without being buffered whole.
pub async fn serve(
    listener: TcpListener,
    coordinator: Coordinator,
    max_line_length: usize,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();
    let (quit_tx, quit_rx) = broadcast::channel::<()>(1);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Server interrupted. Gracefully shutting down.");
                // no live session means no receiver, which is fine
                let _ = quit_tx.send(());
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((socket, addr)) => {
                    tracing::debug!(%addr, "accepted connection");
                    join_set.spawn(session::handle_peer_session(
                        coordinator.clone(),
                        quit_rx.resubscribe(),
                        socket,
                        max_line_length,
                    ));
                }
                Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
            },
            // reap finished sessions so the set does not grow with every connection
            Some(finished) = join_set.join_next(), if !join_set.is_empty() => {
                if let Err(e) = finished.context("session task panicked") {
                    tracing::error!(error = ?e, "session task failed");
                }
            }
        }
    }

    while join_set.join_next().await.is_some() {}

    Ok(())
}
