//! Transport layer error types.

use std::io;

use thiserror::Error;

use crate::core::CodecError;

/// Transport layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A link write accepted zero bytes or failed. The packet is undelivered.
    #[error("link write failed after {sent} of {total} bytes")]
    WriteFailed {
        /// Bytes accepted before the failure.
        sent: usize,
        /// Bytes in the packet.
        total: usize,
    },

    /// The link reported end of stream while a read was pending.
    #[error("link closed")]
    LinkClosed,

    /// I/O error from the link.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Inbound bytes do not form a valid packet frame.
    #[error("frame error: {0}")]
    Frame(#[from] CodecError),

    /// No complete frame arrived within the response timeout.
    #[error("timed out waiting for a response")]
    Timeout,
}

impl TransportError {
    /// Check if the link itself is gone, as opposed to one bad exchange.
    pub fn is_link_lost(&self) -> bool {
        matches!(self, TransportError::LinkClosed | TransportError::Io(_))
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
