use crate::DEFAULT_TICKS;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Stream names must not be empty")]
    EmptyStreamName,

    #[error("Stream `{0}` is configured more than once")]
    DuplicateStream(String),
}

/// Attempts per tick for one named stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRate {
    pub name: String,
    pub rate: u32,
}

/// Per-run parameters. Built once before the run and never mutated while it executes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub ticks: u32,
    pub streams: Vec<StreamRate>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self {
            ticks: DEFAULT_TICKS,
            streams: vec![],
        }
    }

    pub fn ticks(mut self, ticks: u32) -> Self {
        self.ticks = ticks;
        self
    }

    /// Add a stream issuing `rate` attempts every tick. A rate of zero is allowed and simply
    /// produces no bursts.
    pub fn stream(mut self, name: &str, rate: u32) -> Self {
        self.streams.push(StreamRate {
            name: name.to_string(),
            rate,
        });
        self
    }

    pub fn rate(&self, name: &str) -> Option<u32> {
        self.streams
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.rate)
    }

    /// Streams that contribute a burst every tick.
    pub fn active_streams(&self) -> impl Iterator<Item = &StreamRate> {
        self.streams.iter().filter(|s| s.rate > 0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for stream in &self.streams {
            if stream.name.trim().is_empty() {
                return Err(ConfigError::EmptyStreamName);
            }
            if !seen.insert(stream.name.as_str()) {
                return Err(ConfigError::DuplicateStream(stream.name.clone()));
            }
        }
        Ok(())
    }
}
