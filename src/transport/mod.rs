//! Transport layer.
//!
//! Carries MQTT-SN packets over links that only accept a few bytes per
//! write and offer no framing of their own:
//!
//! - **Links**: the [`Link`] primitive pair and the [`StreamLink`] adapter
//!   for tokio byte streams
//! - **Chunking**: [`ChunkedTransport`] splits outbound packets into
//!   link-sized writes and pulls inbound frames byte-exactly
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     Session / Publish / Events          │
//! ├─────────────────────────────────────────┤
//! │         Transport Layer                 │  ← This module
//! │   chunked send, pull reads, framing     │
//! ├─────────────────────────────────────────┤
//! │    Link (BLE UART, serial, duplex)      │
//! └─────────────────────────────────────────┘
//! ```

mod chunked;
mod error;
mod link;

pub use chunked::ChunkedTransport;
pub use error::*;
pub use link::{Link, StreamLink};
