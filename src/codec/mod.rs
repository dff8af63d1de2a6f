//! MQTT-SN v1.2 packet codec.
//!
//! Pure functions over byte slices:
//!
//! - **Headers**: [`frame_length`] and [`length_field_size`] let a reader pull
//!   exactly one packet from a byte stream
//! - **Packets**: [`Packet::encode`] / [`Packet::decode`] for CONNECT,
//!   CONNACK, REGISTER, REGACK, PUBLISH and DISCONNECT
//! - **Function contract**: [`encode_connect`], [`encode_register`],
//!   [`encode_publish`], [`decode_connack`], [`decode_regack`]

mod flags;
mod header;
mod packet;

pub use flags::*;
pub use header::{frame_length, length_field_size, packet_length};
pub use packet::*;
