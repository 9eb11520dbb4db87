//! Coordinator configuration loaded from environment variables
//!
//! Every value has a default, so an empty environment yields a working server
//! listening on port 5001.

use std::{env, str::FromStr};

use anyhow::{ensure, Context, Result};
use comms::transport::server::DEFAULT_MAX_LINE_LENGTH;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_MAX_PLAYLIST_SIZE: usize = 50;
pub const DEFAULT_MAX_URL_LENGTH: usize = 1024;
pub const DEFAULT_BROADCAST_CAPACITY: usize = 100;

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Address to bind the listener to
    pub host: String,

    /// Port to bind the listener to
    pub port: u16,

    /// Maximum number of playlist entries
    pub max_playlist_size: usize,

    /// Maximum length of a media reference, in characters
    pub max_url_length: usize,

    /// Shared playback multiplier
    pub playback_rate: f64,

    /// How many events a slow peer may fall behind before it starts skipping
    pub broadcast_capacity: usize,

    /// Longest command line a peer may send, in bytes
    pub max_line_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_playlist_size: DEFAULT_MAX_PLAYLIST_SIZE,
            max_url_length: DEFAULT_MAX_URL_LENGTH,
            playback_rate: 1.0,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            host: lookup("SYNC_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "SYNC_PORT", DEFAULT_PORT)?,
            max_playlist_size: parse_var(
                &lookup,
                "SYNC_MAX_PLAYLIST_SIZE",
                DEFAULT_MAX_PLAYLIST_SIZE,
            )?,
            max_url_length: parse_var(&lookup, "SYNC_MAX_URL_LENGTH", DEFAULT_MAX_URL_LENGTH)?,
            playback_rate: parse_var(&lookup, "SYNC_PLAYBACK_RATE", 1.0)?,
            broadcast_capacity: parse_var(
                &lookup,
                "SYNC_BROADCAST_CAPACITY",
                DEFAULT_BROADCAST_CAPACITY,
            )?,
            max_line_length: parse_var(&lookup, "SYNC_MAX_LINE_LENGTH", DEFAULT_MAX_LINE_LENGTH)?,
        };

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.playback_rate.is_finite() && self.playback_rate > 0.0,
            "SYNC_PLAYBACK_RATE must be a positive number, got {}",
            self.playback_rate
        );
        ensure!(
            self.max_playlist_size > 0,
            "SYNC_MAX_PLAYLIST_SIZE must be at least 1"
        );
        ensure!(
            self.max_url_length > 0,
            "SYNC_MAX_URL_LENGTH must be at least 1"
        );
        ensure!(
            self.broadcast_capacity > 0,
            "SYNC_BROADCAST_CAPACITY must be at least 1"
        );
        // a link at the length limit has to fit in a single command line
        ensure!(
            self.max_line_length > self.max_url_length,
            "SYNC_MAX_LINE_LENGTH ({}) must be greater than SYNC_MAX_URL_LENGTH ({})",
            self.max_line_length,
            self.max_url_length
        );

        Ok(())
    }

    /// `host:port` string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value: {:?}", key, value)),
        None => Ok(default),
    }
}
