use anyhow::Context;
use comms::{command::RawCommand, event::Event};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::coordinator::{Coordinator, RoomSnapshot, SessionHandle, SessionInfo};

/// [PeerSession] ties one connection to the coordinator: it owns the peer's
/// registration and its subscription to room broadcasts.
pub(super) struct PeerSession {
    coordinator: Coordinator,
    handle: SessionHandle,
    broadcast_rx: broadcast::Receiver<Event>,
}

impl PeerSession {
    /// Register the peer and return the snapshot it has to be sent before anything else
    pub async fn connect(
        coordinator: Coordinator,
        session_info: SessionInfo,
    ) -> (Self, RoomSnapshot) {
        let (broadcast_rx, handle, snapshot) = coordinator.connect(session_info).await;

        (
            PeerSession {
                coordinator,
                handle,
                broadcast_rx,
            },
            snapshot,
        )
    }

    pub fn session_id(&self) -> &str {
        self.handle.session_id()
    }

    /// Handle a command from this peer, returns the reply meant for this peer only
    pub async fn handle_command(&mut self, raw: &RawCommand) -> Option<Event> {
        self.coordinator.handle_command(raw).await
    }

    /// Recieve the next event broadcast to the whole room
    ///
    /// A peer too slow to keep up skips the events it missed, there is no redelivery.
    pub async fn recv(&mut self) -> anyhow::Result<Event> {
        loop {
            match self.broadcast_rx.recv().await {
                Ok(event) => return Ok(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        session_id = self.handle.session_id(),
                        skipped,
                        "peer is lagging behind, skipping events"
                    );
                }
                Err(closed) => return Err(closed).context("room broadcast channel closed"),
            }
        }
    }

    /// Remove the peer from the room
    pub async fn leave(self) {
        self.coordinator.disconnect(self.handle).await;
    }
}
