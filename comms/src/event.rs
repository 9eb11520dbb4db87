use serde::{Deserialize, Serialize};

/// Whether the shared playback is advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Playing,
    Paused,
}

/// Full snapshot of the shared room state
///
/// Clients extrapolate the current position from the anchor pair,
/// see [SyncStateEvent::effective_position].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStateEvent {
    /// The media currently selected, if any
    pub url: Option<String>,
    pub status: PlaybackStatus,
    /// Multiplier applied to elapsed wall time while playing
    pub playback_rate: f64,
    /// Position in seconds that was true at `anchor_server_time`
    pub anchor_position: f64,
    /// Server clock in milliseconds at which `anchor_position` was true
    pub anchor_server_time: i64,
    /// Server clock in milliseconds of the last applied control action
    pub last_updated: i64,
}

impl SyncStateEvent {
    /// Position in seconds at the given server time.
    pub fn effective_position(&self, server_now_ms: f64) -> f64 {
        match self.status {
            PlaybackStatus::Paused => self.anchor_position,
            PlaybackStatus::Playing => {
                let elapsed_ms = (server_now_ms - self.anchor_server_time as f64).max(0.0);
                self.anchor_position + elapsed_ms / 1000.0 * self.playback_rate
            }
        }
    }
}

/// Reply to a `time_sync` probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSyncResponseEvent {
    /// Echo of the client's send time
    pub client_send_time: f64,
    /// Server clock in milliseconds when the probe was handled
    pub server_receive_time: i64,
}

/// A notice that an understood action was refused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessageEvent {
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
/// Events that can be sent to the client
/// `update_playlist` and `sync_state` are broadcast to every peer, the rest are replies to a single peer
pub enum Event {
    UpdatePlaylist(Vec<String>),
    SyncState(SyncStateEvent),
    TimeSyncResponse(TimeSyncResponseEvent),
    ErrorMessage(ErrorMessageEvent),
}
