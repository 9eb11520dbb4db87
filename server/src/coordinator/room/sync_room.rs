use comms::event::{Event, SyncStateEvent};
use tokio::sync::broadcast;

use crate::{error::Rejection, validator::Command};

use super::{
    playlist::Playlist,
    room_state::{RoomState, Transition},
    session_handle::{SessionHandle, SessionInfo},
    session_registry::SessionRegistry,
};

#[derive(Debug, Clone, Copy, PartialEq)]
/// [RoomSettings] holds the knobs a room is created with
pub struct RoomSettings {
    pub playback_rate: f64,
    pub max_playlist_size: usize,
    pub broadcast_capacity: usize,
}

/// What a peer needs to know right after connecting
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub playlist: Vec<String>,
    pub state: SyncStateEvent,
}

impl RoomSnapshot {
    /// Playlist first, so a state never references media the peer has not heard of
    pub fn into_events(self) -> [Event; 2] {
        [
            Event::UpdatePlaylist(self.playlist),
            Event::SyncState(self.state),
        ]
    }
}

#[derive(Debug)]
/// [SyncRoom] owns the shared playback state, the playlist and the primary broadcast channel
/// A [SessionHandle] is handed out to a peer when it connects
pub struct SyncRoom {
    state: RoomState,
    playlist: Playlist,
    sessions: SessionRegistry,
    broadcast_tx: broadcast::Sender<Event>,
}

impl SyncRoom {
    pub fn new(settings: RoomSettings) -> Self {
        let (broadcast_tx, _) = broadcast::channel(settings.broadcast_capacity);

        SyncRoom {
            state: RoomState::new(settings.playback_rate),
            playlist: Playlist::new(settings.max_playlist_size),
            sessions: SessionRegistry::new(),
            broadcast_tx,
        }
    }

    pub fn peer_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            playlist: self.playlist.entries().to_vec(),
            state: self.state.to_event(),
        }
    }

    /// Register a peer in the room
    ///
    /// # Returns
    ///
    /// - A broadcast receiver for the peer to receive every later change of the room
    /// - A [SessionHandle] for the peer to leave the room with
    /// - A [RoomSnapshot] taken at the same point, so nothing is missed or seen twice
    pub fn join(
        &mut self,
        session_info: SessionInfo,
    ) -> (broadcast::Receiver<Event>, SessionHandle, RoomSnapshot) {
        let broadcast_rx = self.broadcast_tx.subscribe();
        let handle = SessionHandle::new(session_info);

        if !self.sessions.insert(&handle) {
            tracing::warn!(session_id = handle.session_id(), "session id registered twice");
        }

        (broadcast_rx, handle, self.snapshot())
    }

    /// Remove a peer from the room
    /// Consume the [SessionHandle] to drop it
    pub fn leave(&mut self, handle: SessionHandle) -> bool {
        self.sessions.remove(&handle)
    }

    /// Apply a validated command and broadcast the result to every peer
    pub fn apply(&mut self, command: Command, now_ms: i64) -> Result<(), Rejection> {
        match command {
            Command::AddSong { reference } => {
                self.playlist.ensure_room()?;

                if self.playlist.add(reference.sanitize()?)? {
                    tracing::debug!(size = self.playlist.len(), "song added");
                    self.broadcast_playlist();
                }
            }
            Command::RemoveSong { reference } => {
                if self.playlist.remove(&reference) {
                    tracing::debug!(size = self.playlist.len(), "song removed");
                    self.broadcast_playlist();
                }
            }
            Command::Switch { reference } => {
                self.state.switch(reference, now_ms);
                self.broadcast_state();
            }
            Command::Play => {
                if self.state.play(now_ms) == Transition::Unchanged {
                    tracing::trace!("play while playing, resending state");
                }
                self.broadcast_state();
            }
            Command::Pause => {
                if self.state.pause(now_ms) == Transition::Unchanged {
                    tracing::trace!("pause while paused, resending state");
                }
                self.broadcast_state();
            }
            Command::Seek { position } => {
                self.state.seek(position, now_ms);
                self.broadcast_state();
            }
            // answered by the coordinator, the room is not involved
            Command::TimeSync { .. } => {}
        }

        Ok(())
    }

    fn broadcast_playlist(&self) {
        self.broadcast(Event::UpdatePlaylist(self.playlist.entries().to_vec()));
    }

    fn broadcast_state(&self) {
        self.broadcast(Event::SyncState(self.state.to_event()));
    }

    fn broadcast(&self, event: Event) {
        // no receivers is fine, nobody is listening
        let _ = self.broadcast_tx.send(event);
    }
}
