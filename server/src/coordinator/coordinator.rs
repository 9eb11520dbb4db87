use std::{fmt, sync::Arc};

use comms::{
    command::RawCommand,
    event::{ErrorMessageEvent, Event, TimeSyncResponseEvent},
};
use tokio::sync::{broadcast, Mutex};

use crate::{
    clock::Clock,
    error::Rejection,
    validator::{Command, Validator},
};

use super::room::{RoomSnapshot, SessionHandle, SessionInfo, SyncRoom};

pub type RoomJoinResult = (broadcast::Receiver<Event>, SessionHandle, RoomSnapshot);

/// [Coordinator] is the only way into the shared room.
///
/// Every mutation takes the room lock for exactly one command and broadcasts before
/// releasing it, so mutations are applied and announced in arrival order.
#[derive(Clone)]
pub struct Coordinator {
    room: Arc<Mutex<SyncRoom>>,
    validator: Validator,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    pub(super) fn new(room: SyncRoom, validator: Validator, clock: Arc<dyn Clock>) -> Self {
        Coordinator {
            room: Arc::new(Mutex::new(room)),
            validator,
            clock,
        }
    }

    /// Registers a new peer and takes the snapshot it has to be sent first
    pub async fn connect(&self, session_info: SessionInfo) -> RoomJoinResult {
        let mut room = self.room.lock().await;
        let result = room.join(session_info);

        tracing::info!(
            session_id = result.1.session_id(),
            peer_addr = ?result.1.peer_addr(),
            peers = room.peer_count(),
            "peer connected"
        );

        result
    }

    /// Removes a peer, nothing else about the room changes
    pub async fn disconnect(&self, handle: SessionHandle) {
        let mut room = self.room.lock().await;
        let session_id = String::from(handle.session_id());
        let peer_addr = handle.peer_addr();

        if room.leave(handle) {
            tracing::info!(
                %session_id,
                ?peer_addr,
                peers = room.peer_count(),
                "peer disconnected"
            );
        }
    }

    pub async fn peer_count(&self) -> usize {
        self.room.lock().await.peer_count()
    }

    pub async fn snapshot(&self) -> RoomSnapshot {
        self.room.lock().await.snapshot()
    }

    /// Validate and apply a command from one peer
    ///
    /// # Returns
    ///
    /// The event to send back to that peer only, if any. Changes of the room
    /// reach every peer through the broadcast channel instead.
    pub async fn handle_command(&self, raw: &RawCommand) -> Option<Event> {
        let command = match self.validator.decode(raw) {
            Ok(command) => command,
            Err(rejection) => return self.reject(&raw.event, rejection),
        };

        if let Command::TimeSync { client_send_time } = command {
            return Some(self.measure(client_send_time));
        }

        let result = {
            let mut room = self.room.lock().await;
            // read the clock under the lock so anchors follow application order
            let now_ms = self.clock.now_ms();

            room.apply(command, now_ms)
        };

        match result {
            Ok(()) => None,
            Err(rejection) => self.reject(&raw.event, rejection),
        }
    }

    /// Echo a clock probe with the server time attached
    pub fn measure(&self, client_send_time: f64) -> Event {
        Event::TimeSyncResponse(TimeSyncResponseEvent {
            client_send_time,
            server_receive_time: self.clock.now_ms(),
        })
    }

    fn reject(&self, event: &str, rejection: Rejection) -> Option<Event> {
        match rejection.notice() {
            Some(msg) => {
                tracing::debug!(event, %rejection, "command refused");
                Some(Event::ErrorMessage(ErrorMessageEvent { msg }))
            }
            None => {
                tracing::debug!(event, %rejection, "dropping malformed command");
                None
            }
        }
    }
}
