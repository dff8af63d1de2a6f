//! Session configuration.

use std::time::Duration;

use crate::core::ConfigError;
use crate::core::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_KEEP_ALIVE, DEFAULT_MAX_PACKET_SIZE, DEFAULT_RESPONSE_TIMEOUT,
    DEFAULT_SETTLE_INTERVAL, DEFAULT_TOPIC_PREFIX, MAX_LINK_WRITE,
};

/// Smallest packet bound that still fits a REGISTER with a short topic.
const MIN_MAX_PACKET_SIZE: usize = 16;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Bytes per link write.
    pub chunk_size: usize,

    /// Wait between sending a request and reading its acknowledgement.
    pub settle_interval: Duration,

    /// Bound on reading one acknowledgement after the settle interval.
    pub response_timeout: Duration,

    /// Keep-alive announced in CONNECT (whole seconds).
    pub keep_alive: Duration,

    /// Ask the gateway to discard earlier session state.
    pub clean_session: bool,

    /// Prefix joined with the client identifier to form the topic name.
    pub topic_prefix: String,

    /// Largest packet sent or accepted.
    pub max_packet_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            settle_interval: DEFAULT_SETTLE_INTERVAL,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            keep_alive: DEFAULT_KEEP_ALIVE,
            clean_session: true,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

impl SessionConfig {
    /// Check every field against link and wire limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 || self.chunk_size > MAX_LINK_WRITE {
            return Err(ConfigError::InvalidChunkSize {
                size: self.chunk_size,
                max: MAX_LINK_WRITE,
            });
        }
        if self.max_packet_size < MIN_MAX_PACKET_SIZE {
            return Err(ConfigError::MaxPacketSizeTooSmall(self.max_packet_size));
        }
        if self.keep_alive.as_secs() > u64::from(u16::MAX) {
            return Err(ConfigError::KeepAliveTooLong(self.keep_alive.as_secs()));
        }
        if self.topic_prefix.is_empty() {
            return Err(ConfigError::EmptyTopicPrefix);
        }
        Ok(())
    }

    /// Topic name for a client identifier.
    pub fn topic_name(&self, client_id: &str) -> String {
        format!("{}{}", self.topic_prefix, client_id)
    }

    /// Keep-alive as the 16-bit CONNECT duration field.
    pub(crate) fn keep_alive_secs(&self) -> u16 {
        u16::try_from(self.keep_alive.as_secs()).unwrap_or(u16::MAX)
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the settle interval.
    pub fn settle_interval(mut self, interval: Duration) -> Self {
        self.config.settle_interval = interval;
        self
    }

    /// Set the response timeout.
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    /// Set the keep-alive.
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.config.keep_alive = keep_alive;
        self
    }

    /// Enable or disable clean session.
    pub fn clean_session(mut self, clean: bool) -> Self {
        self.config.clean_session = clean;
        self
    }

    /// Set the topic prefix.
    pub fn topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.topic_prefix = prefix.into();
        self
    }

    /// Set the packet size bound.
    pub fn max_packet_size(mut self, size: usize) -> Self {
        self.config.max_packet_size = size;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}
