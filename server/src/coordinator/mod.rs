use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    config::{self, Config},
    validator::Validator,
};

use self::room::{RoomSettings, SyncRoom};
pub use self::room::{RoomSnapshot, SessionHandle, SessionInfo};

pub use self::coordinator::{Coordinator, RoomJoinResult};

#[allow(clippy::module_inception)]
mod coordinator;
pub mod room;

pub struct CoordinatorBuilder {
    settings: RoomSettings,
    max_url_length: usize,
    clock: Arc<dyn Clock>,
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        CoordinatorBuilder {
            settings: RoomSettings {
                playback_rate: 1.0,
                max_playlist_size: config::DEFAULT_MAX_PLAYLIST_SIZE,
                broadcast_capacity: config::DEFAULT_BROADCAST_CAPACITY,
            },
            max_url_length: config::DEFAULT_MAX_URL_LENGTH,
            clock: Arc::new(SystemClock),
        }
    }

    /// Start from the limits of a loaded [Config]
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .playback_rate(config.playback_rate)
            .max_playlist_size(config.max_playlist_size)
            .max_url_length(config.max_url_length)
            .broadcast_capacity(config.broadcast_capacity)
    }

    pub fn playback_rate(mut self, playback_rate: f64) -> Self {
        self.settings.playback_rate = playback_rate;
        self
    }

    pub fn max_playlist_size(mut self, max_playlist_size: usize) -> Self {
        self.settings.max_playlist_size = max_playlist_size;
        self
    }

    pub fn max_url_length(mut self, max_url_length: usize) -> Self {
        self.max_url_length = max_url_length;
        self
    }

    pub fn broadcast_capacity(mut self, broadcast_capacity: usize) -> Self {
        self.settings.broadcast_capacity = broadcast_capacity;
        self
    }

    /// Replace the wall clock, tests use a manual one
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Coordinator {
        Coordinator::new(
            SyncRoom::new(self.settings),
            Validator::new(self.max_url_length),
            self.clock,
        )
    }
}
