//! Error types shared across layers.

use thiserror::Error;

/// Errors raised while encoding or decoding MQTT-SN packets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Buffer ended before the packet did.
    #[error("packet too short: expected {expected} bytes, got {actual}")]
    TooShort {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Length header disagrees with the buffer.
    #[error("length mismatch: header says {declared}, buffer holds {actual}")]
    LengthMismatch {
        /// Length carried in the header.
        declared: usize,
        /// Actual buffer length.
        actual: usize,
    },

    /// Length header is smaller than the header itself.
    #[error("invalid length field: {0}")]
    InvalidLength(usize),

    /// Message type byte not defined by MQTT-SN.
    #[error("unknown message type: {0:#04x}")]
    UnknownType(u8),

    /// Message type is defined but not handled by this client.
    #[error("unsupported message type: {0:#04x}")]
    UnsupportedType(u8),

    /// Reserved flag combination.
    #[error("invalid flags: {0:#04x}")]
    InvalidFlags(u8),

    /// Return code outside 0x00..=0x03.
    #[error("invalid return code: {0:#04x}")]
    InvalidReturnCode(u8),

    /// Client identifier is empty or longer than 23 bytes.
    #[error("invalid client identifier length: {0}")]
    InvalidClientId(usize),

    /// Topic name is empty.
    #[error("topic name must not be empty")]
    EmptyTopicName,

    /// Encoded packet would exceed the 16-bit length field.
    #[error("packet too large: {0} bytes")]
    PacketTooLarge(usize),

    /// String field is not valid UTF-8.
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),
}

/// Errors in session configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Chunk size is zero or larger than a single link write.
    #[error("chunk size {size} outside 1..={max}")]
    InvalidChunkSize {
        /// Configured size.
        size: usize,
        /// Largest allowed size.
        max: usize,
    },

    /// Packet size bound cannot hold the smallest useful packet.
    #[error("max packet size {0} is too small")]
    MaxPacketSizeTooSmall(usize),

    /// Keep-alive does not fit the 16-bit CONNECT duration field.
    #[error("keep-alive of {0}s does not fit in 16 bits")]
    KeepAliveTooLong(u64),

    /// Topic prefix is empty.
    #[error("topic prefix must not be empty")]
    EmptyTopicPrefix,
}

/// Top-level errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport error.
    #[cfg(feature = "transport")]
    #[error("transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    /// Session error.
    #[cfg(feature = "client")]
    #[error("session error: {0}")]
    Session(#[from] crate::client::SessionError),

    /// Publish error.
    #[cfg(feature = "client")]
    #[error("publish error: {0}")]
    Publish(#[from] crate::client::PublishError),
}
