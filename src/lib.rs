//! # mqttsn-link
//!
//! An MQTT-SN v1.2 publish client for links that only accept a handful of
//! bytes per write, such as BLE UART bridges and serial radios.
//!
//! A device connects to an MQTT-SN gateway, registers a single topic named
//! after itself, and publishes small payloads to it at QoS 0:
//!
//! - **Chunking**: every packet is split into link-sized writes (18 bytes by
//!   default) and inbound packets are reassembled from the length header
//! - **Handshake**: CONNECT → CONNACK → REGISTER → REGACK, one attempt at a
//!   time, with a settle interval before each acknowledgement read
//! - **Publishing**: publish reconnects on demand, exactly once per call
//! - **Events**: link up/down and user actions map onto session operations
//!
//! ## Feature Flags
//!
//! - `transport` (default): chunked transport and tokio stream links
//! - `client` (default): session, publish, event adapter
//!
//! ## Modules
//!
//! - [`core`]: Constants, error types, and collaborator traits (always included)
//! - [`codec`]: MQTT-SN packet encoding and decoding (always included)
//! - [`transport`]: Chunked link transport (requires `transport` feature)
//! - [`client`]: Session state machine and publishing (requires `client` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use mqttsn_link::codec::{Packet, QoS, TopicId, encode_publish};
//!
//! let bytes = encode_publish(TopicId::Normal(1), 0, QoS::AtMostOnce, false, false, b"A")?;
//! assert_eq!(bytes, [0x08, 0x0C, 0x00, 0x00, 0x01, 0x00, 0x00, b'A']);
//!
//! let Packet::Publish(publish) = Packet::decode(&bytes)? else {
//!     unreachable!();
//! };
//! assert_eq!(publish.data, b"A");
//! # Ok::<(), mqttsn_link::core::CodecError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Packet codec (always included)
pub mod codec;

// Transport layer (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Client API (feature-gated)
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod client;

#[cfg(all(test, feature = "transport"))]
mod testing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;

    pub use crate::codec::{Packet, PacketType, QoS, ReturnCode, TopicId};

    #[cfg(feature = "transport")]
    pub use crate::transport::{
        ChunkedTransport, Link, StreamLink, TransportError, TransportResult,
    };

    #[cfg(feature = "client")]
    pub use crate::client::{
        AccelerometerSample, EventAdapter, FixedPayload, LinkEvent, PayloadBuilder,
        PublishError, Session, SessionConfig, SessionConfigBuilder, SessionError, SessionPhase,
    };
}

// Re-export commonly used items at crate root
pub use core::{CodecError, ConfigError, DeviceIdentity, Error, Indicator};

#[cfg(feature = "client")]
pub use client::{Session, SessionConfig};
