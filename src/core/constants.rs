//! Protocol and link constants.
//!
//! Wire values follow MQTT-SN v1.2. Link values describe the constrained
//! byte link the client was built for (a BLE UART service).

use std::time::Duration;

// =============================================================================
// LINK
// =============================================================================

/// Largest write the link accepts in a single call.
pub const MAX_LINK_WRITE: usize = 20;

/// Default chunk size, leaving headroom below [`MAX_LINK_WRITE`] for
/// link-layer overhead.
pub const DEFAULT_CHUNK_SIZE: usize = 18;

/// Default upper bound on a single MQTT-SN packet, in either direction.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 200;

// =============================================================================
// TIMING
// =============================================================================

/// Fixed wait after sending a request before reading its acknowledgement.
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_millis(2000);

/// Upper bound on reading one acknowledgement once the settle interval ends.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Keep-alive duration announced in CONNECT.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(10);

// =============================================================================
// TOPICS
// =============================================================================

/// Prefix prepended to the client identifier to form the session's topic.
pub const DEFAULT_TOPIC_PREFIX: &str = "microbit/";

/// First packet identifier handed out by a fresh session.
pub const FIRST_PACKET_ID: u16 = 1;

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Protocol id carried in CONNECT.
pub const PROTOCOL_ID: u8 = 0x01;

/// Marker in the first length byte selecting the 3-byte length form.
pub const LONG_LENGTH_MARKER: u8 = 0x01;

/// Largest total packet length encodable with a 1-byte length field.
pub const MAX_SHORT_LENGTH: usize = 0xFF;

/// Largest total packet length encodable at all.
pub const MAX_PACKET_LENGTH: usize = 0xFFFF;

/// Maximum client identifier length (MQTT-SN v1.2 §5.3.1).
pub const MAX_CLIENT_ID_LEN: usize = 23;
