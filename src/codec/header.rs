//! MQTT-SN length header.
//!
//! Wire format:
//! ```text
//! short form (total ≤ 255):   +--------+---------+----------+
//!                             | Length | MsgType | Body ... |
//!                             +--------+---------+----------+
//!
//! long form (total ≤ 65535):  +------+------------+---------+----------+
//!                             | 0x01 | Length BE  | MsgType | Body ... |
//!                             +------+------------+---------+----------+
//! ```
//! The length always counts the whole packet, header included.

use crate::core::CodecError;
use crate::core::constants::{LONG_LENGTH_MARKER, MAX_PACKET_LENGTH, MAX_SHORT_LENGTH};

/// Size of the length field given its first byte (1 or 3).
pub fn length_field_size(first: u8) -> usize {
    if first == LONG_LENGTH_MARKER { 3 } else { 1 }
}

/// Total packet length announced by a complete length field.
///
/// `field` must hold exactly [`length_field_size`] bytes.
pub fn frame_length(field: &[u8]) -> Result<usize, CodecError> {
    let first = *field.first().ok_or(CodecError::TooShort {
        expected: 1,
        actual: 0,
    })?;
    let field_size = length_field_size(first);
    if field.len() < field_size {
        return Err(CodecError::TooShort {
            expected: field_size,
            actual: field.len(),
        });
    }

    let total = if field_size == 1 {
        first as usize
    } else {
        u16::from_be_bytes([field[1], field[2]]) as usize
    };

    // Length plus message type is the smallest legal packet.
    if total <= field_size {
        return Err(CodecError::InvalidLength(total));
    }
    Ok(total)
}

/// Whole-packet length for `body_len` bytes after the message type.
pub fn packet_length(body_len: usize) -> usize {
    if body_len + 2 <= MAX_SHORT_LENGTH {
        body_len + 2
    } else {
        body_len + 4
    }
}

/// Write a header for a packet with `body_len` bytes after the message type.
pub(crate) fn write_header(
    buf: &mut Vec<u8>,
    msg_type: u8,
    body_len: usize,
) -> Result<(), CodecError> {
    let total = packet_length(body_len);
    if total <= MAX_SHORT_LENGTH {
        buf.push(total as u8);
    } else {
        if total > MAX_PACKET_LENGTH {
            return Err(CodecError::PacketTooLarge(total));
        }
        buf.push(LONG_LENGTH_MARKER);
        buf.extend_from_slice(&(total as u16).to_be_bytes());
    }
    buf.push(msg_type);
    Ok(())
}

/// Split a complete packet into its message type byte and body.
pub(crate) fn split_packet(bytes: &[u8]) -> Result<(u8, &[u8]), CodecError> {
    let total = frame_length(bytes)?;
    if bytes.len() != total {
        return Err(CodecError::LengthMismatch {
            declared: total,
            actual: bytes.len(),
        });
    }
    let type_offset = length_field_size(bytes[0]);
    Ok((bytes[type_offset], &bytes[type_offset + 1..]))
}
