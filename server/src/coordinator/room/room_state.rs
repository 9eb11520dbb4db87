use comms::event::{PlaybackStatus, SyncStateEvent};

/// Outcome of a control action on the [RoomState]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new anchor was installed
    Applied,
    /// The room already was in the requested status
    Unchanged,
}

/// The single shared playback state of the room.
///
/// Playback position is not stored directly. The state keeps an anchor, a position
/// that was true at a given server time, and extrapolates from it:
///
/// - paused: `anchor_position`
/// - playing: `anchor_position + (now - anchor_server_time) / 1000 * playback_rate`
///
/// Each control action settles the position under the current anchor before it
/// installs a new one, so elapsed playback time only disappears on `switch` or `seek`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomState {
    current_media: Option<String>,
    status: PlaybackStatus,
    playback_rate: f64,
    anchor_position: f64,
    anchor_server_time: i64,
    last_updated: i64,
}

impl RoomState {
    pub fn new(playback_rate: f64) -> Self {
        RoomState {
            current_media: None,
            status: PlaybackStatus::Paused,
            playback_rate,
            anchor_position: 0.0,
            anchor_server_time: 0,
            last_updated: 0,
        }
    }

    /// Playback position in seconds at server time `now_ms`
    pub fn effective_position(&self, now_ms: i64) -> f64 {
        match self.status {
            PlaybackStatus::Paused => self.anchor_position,
            PlaybackStatus::Playing => {
                // a clock stepping backwards must not rewind playback
                let elapsed_ms = now_ms.saturating_sub(self.anchor_server_time).max(0);
                self.anchor_position + elapsed_ms as f64 / 1000.0 * self.playback_rate
            }
        }
    }

    /// Select a new media and start it from the beginning
    pub fn switch(&mut self, reference: String, now_ms: i64) -> Transition {
        let settled = self.settle(now_ms);
        tracing::debug!(
            from = ?self.current_media,
            to = %reference,
            settled,
            "switching media"
        );

        self.current_media = Some(reference);
        self.status = PlaybackStatus::Playing;
        self.install_anchor(0.0, now_ms);

        Transition::Applied
    }

    pub fn play(&mut self, now_ms: i64) -> Transition {
        self.change_status(PlaybackStatus::Playing, now_ms)
    }

    pub fn pause(&mut self, now_ms: i64) -> Transition {
        self.change_status(PlaybackStatus::Paused, now_ms)
    }

    /// Jump to `position` seconds, negative targets are clamped to zero
    pub fn seek(&mut self, position: f64, now_ms: i64) -> Transition {
        let settled = self.settle(now_ms);
        let target = position.max(0.0);
        tracing::debug!(settled, target, "seeking");

        self.install_anchor(target, now_ms);

        Transition::Applied
    }

    fn change_status(&mut self, status: PlaybackStatus, now_ms: i64) -> Transition {
        let settled = self.settle(now_ms);

        if self.status == status {
            return Transition::Unchanged;
        }

        tracing::debug!(?status, settled, "changing playback status");
        self.status = status;
        self.install_anchor(settled, now_ms);

        Transition::Applied
    }

    /// Position under the current anchor, also marks the room as touched
    fn settle(&mut self, now_ms: i64) -> f64 {
        self.last_updated = now_ms;

        self.effective_position(now_ms)
    }

    fn install_anchor(&mut self, position: f64, now_ms: i64) {
        self.anchor_position = position;
        self.anchor_server_time = now_ms;
    }

    /// Wire representation broadcast to peers
    pub fn to_event(&self) -> SyncStateEvent {
        SyncStateEvent {
            url: self.current_media.clone(),
            status: self.status,
            playback_rate: self.playback_rate,
            anchor_position: self.anchor_position,
            anchor_server_time: self.anchor_server_time,
            last_updated: self.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const MEDIA: &str = "https://x/a";

    fn anchor(state: &RoomState) -> (f64, i64) {
        (state.anchor_position, state.anchor_server_time)
    }

    fn playing_from(position: f64, now_ms: i64, rate: f64) -> RoomState {
        let mut state = RoomState::new(rate);
        state.switch(MEDIA.to_string(), now_ms);
        state.seek(position, now_ms);
        state
    }

    #[test]
    fn test_initial_state() {
        let state = RoomState::new(1.0);

        assert_eq!(state.current_media.as_deref(), None);
        assert_eq!(state.status, PlaybackStatus::Paused);
        assert_eq!(anchor(&state), (0.0, 0));
        assert_eq!(state.effective_position(99_999), 0.0);
    }

    #[test]
    fn test_pause_keeps_elapsed_time() {
        let mut state = playing_from(10.0, 1_000, 1.5);

        assert_eq!(state.pause(5_000), Transition::Applied);

        // 4s at 1.5x
        assert_eq!(anchor(&state), (16.0, 5_000));
        assert_eq!(state.effective_position(60_000), 16.0);
    }

    #[test]
    fn test_play_resumes_without_jump() {
        let mut state = playing_from(10.0, 1_000, 1.0);
        state.pause(3_000);

        assert_eq!(state.play(20_000), Transition::Applied);

        assert_eq!(anchor(&state), (12.0, 20_000));
        assert_eq!(state.effective_position(20_000), 12.0);
        assert_eq!(state.effective_position(21_000), 13.0);
    }

    #[test]
    fn test_play_twice_is_a_noop() {
        let mut state = RoomState::new(1.0);
        state.play(1_000);
        let before = anchor(&state);

        assert_eq!(state.play(4_000), Transition::Unchanged);
        assert_eq!(anchor(&state), before);
        assert_eq!(state.status, PlaybackStatus::Playing);
    }

    #[test]
    fn test_pause_twice_is_a_noop() {
        let mut state = playing_from(0.0, 0, 1.0);
        state.pause(2_000);

        assert_eq!(state.pause(9_000), Transition::Unchanged);
        assert_eq!(anchor(&state), (2.0, 2_000));
    }

    #[test]
    fn test_switch_resets_regardless_of_prior_state() {
        let mut state = playing_from(30.0, 0, 1.0);
        state.pause(5_000);

        assert_eq!(
            state.switch("https://x/b".to_string(), 8_000),
            Transition::Applied
        );

        assert_eq!(state.current_media.as_deref(), Some("https://x/b"));
        assert_eq!(state.status, PlaybackStatus::Playing);
        assert_eq!(anchor(&state), (0.0, 8_000));
    }

    #[test]
    fn test_seek_clamps_and_keeps_status() {
        let mut state = playing_from(0.0, 0, 1.0);
        state.pause(1_000);

        state.seek(-5.0, 2_000);
        assert_eq!(anchor(&state), (0.0, 2_000));
        assert_eq!(state.status, PlaybackStatus::Paused);

        state.seek(42.5, 3_000);
        assert_eq!(anchor(&state), (42.5, 3_000));
        assert_eq!(state.status, PlaybackStatus::Paused);
    }

    #[test]
    fn test_backwards_clock_does_not_rewind() {
        let state = playing_from(5.0, 10_000, 1.0);

        assert_eq!(state.effective_position(9_000), 5.0);
    }

    #[test]
    fn test_last_updated_tracks_every_action() {
        let mut state = RoomState::new(1.0);
        state.play(1_000);
        state.play(2_000);

        assert_eq!(state.to_event().last_updated, 2_000);
        assert_eq!(state.to_event().anchor_server_time, 1_000);
    }

    #[test]
    fn test_to_event() {
        let state = playing_from(1.0, 500, 1.0);

        assert_eq!(
            state.to_event(),
            SyncStateEvent {
                url: Some(MEDIA.to_string()),
                status: PlaybackStatus::Playing,
                playback_rate: 1.0,
                anchor_position: 1.0,
                anchor_server_time: 500,
                last_updated: 500,
            }
        );
    }
}
