//! Client half of the clock synchronization contract.
//!
//! The server only echoes probes with its own timestamp attached. Clients feed the
//! replies into a [ClockEstimator] to learn how far their local clock is from the
//! server's, and use [correct_drift] to steer the local player towards the shared
//! position.

use std::collections::VecDeque;

use crate::event::TimeSyncResponseEvent;

/// How many probes a client sends right after connecting.
pub const DEFAULT_PROBE_COUNT: usize = 5;
/// Delay between two consecutive probes, in milliseconds.
pub const DEFAULT_PROBE_INTERVAL_MILLIS: u64 = 200;

const DEFAULT_SAMPLE_WINDOW: usize = 8;

/// One completed `time_sync` round trip, all values in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSample {
    pub client_send_time: f64,
    pub server_receive_time: f64,
    pub client_receive_time: f64,
}

impl ClockSample {
    pub fn from_response(response: &TimeSyncResponseEvent, client_receive_time: f64) -> Self {
        ClockSample {
            client_send_time: response.client_send_time,
            server_receive_time: response.server_receive_time as f64,
            client_receive_time,
        }
    }

    pub fn round_trip(&self) -> f64 {
        self.client_receive_time - self.client_send_time
    }

    /// Offset such that `server_time = local_time + offset`, assuming a symmetric path.
    pub fn offset(&self) -> f64 {
        self.server_receive_time - (self.client_receive_time - self.round_trip() / 2.0)
    }
}

/// Keeps the most recent samples and trusts the one with the lowest round trip,
/// as it carries the least queuing delay.
#[derive(Debug, Clone)]
pub struct ClockEstimator {
    samples: VecDeque<ClockSample>,
    window: usize,
}

impl Default for ClockEstimator {
    fn default() -> Self {
        Self::with_window(DEFAULT_SAMPLE_WINDOW)
    }
}

impl ClockEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window: usize) -> Self {
        let window = window.max(1);

        ClockEstimator {
            samples: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Record a sample. Returns false if the sample was discarded.
    pub fn record(&mut self, sample: ClockSample) -> bool {
        let round_trip = sample.round_trip();
        if !round_trip.is_finite() || round_trip < 0.0 || !sample.offset().is_finite() {
            return false;
        }

        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);

        true
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// The sample with the lowest round trip in the window
    pub fn best_sample(&self) -> Option<&ClockSample> {
        self.samples
            .iter()
            .min_by(|a, b| a.round_trip().total_cmp(&b.round_trip()))
    }

    pub fn offset(&self) -> Option<f64> {
        self.best_sample().map(ClockSample::offset)
    }

    /// Estimated server clock for the given local time, `None` until a sample arrived.
    pub fn server_time(&self, local_now: f64) -> Option<f64> {
        self.offset().map(|offset| local_now + offset)
    }
}

/// Tolerances used by [correct_drift], positions in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftThresholds {
    /// Below this the player is considered in sync
    pub soft: f64,
    /// Above this the player jumps straight to the target
    pub hard: f64,
    /// Rate used to catch up when behind
    pub fast_rate: f64,
    /// Rate used to wait when ahead
    pub slow_rate: f64,
}

impl Default for DriftThresholds {
    fn default() -> Self {
        DriftThresholds {
            soft: 0.5,
            hard: 3.0,
            fast_rate: 1.05,
            slow_rate: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriftCorrection {
    /// Play at the normal rate
    InSync,
    /// Temporarily play at the given rate
    Nudge { rate: f64 },
    /// Seek to the target position
    Jump { target: f64 },
}

/// Decide how a local player at `local_position` should converge to `target_position`.
pub fn correct_drift(
    local_position: f64,
    target_position: f64,
    thresholds: &DriftThresholds,
) -> DriftCorrection {
    let diff = local_position - target_position;

    if diff.abs() < thresholds.soft {
        DriftCorrection::InSync
    } else if diff.abs() > thresholds.hard {
        DriftCorrection::Jump {
            target: target_position,
        }
    } else if diff < 0.0 {
        DriftCorrection::Nudge {
            rate: thresholds.fast_rate,
        }
    } else {
        DriftCorrection::Nudge {
            rate: thresholds.slow_rate,
        }
    }
}
